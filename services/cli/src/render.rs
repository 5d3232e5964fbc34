use house_hunter::underwriting::Underwriting;
use std::io::{self, Write};

const RULE_WIDTH: usize = 120;

/// Context echoed in the report header.
pub(crate) struct ReportHeader<'a> {
    pub(crate) location: &'a str,
    pub(crate) max_price: f64,
}

pub(crate) fn render_json<W: Write>(
    out: &mut W,
    results: &[Underwriting],
) -> Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out).map_err(serde_json::Error::io)
}

pub(crate) fn render_text<W: Write>(
    out: &mut W,
    results: &[Underwriting],
    header: &ReportHeader<'_>,
) -> io::Result<()> {
    if results.is_empty() {
        writeln!(out, "No positive-cashflow houses found with current constraints.")?;
        writeln!(
            out,
            "Try one or more adjustments: increase --max-down-payment, lower --max-price, or reduce maintenance/management/vacancy assumptions."
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "Found {} recommended investment properties in {} under {}.",
        results.len(),
        header.location.trim().to_uppercase(),
        dollars(header.max_price)
    )?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

    for (rank, result) in results.iter().enumerate() {
        let listing = &result.listing;
        let cashflow = &result.cashflow;

        writeln!(
            out,
            "#{} | {}, {}, {} {} | List {}",
            rank + 1,
            listing.address,
            listing.city,
            listing.state,
            listing.zip_code,
            dollars(listing.price)
        )?;
        writeln!(
            out,
            "    Specs: {}bd/{}ba | {} sqft | Built {} | Lot {} sqft",
            optional(listing.bedrooms, |value| format!("{value:.0}")),
            optional(listing.bathrooms, |value| format!("{value:.1}")),
            optional(listing.sqft, grouped),
            listing
                .year_built
                .map_or_else(|| "?".to_string(), |year| year.to_string()),
            optional(listing.lot_size_sqft, grouped),
        )?;

        let fit = result
            .preference_fit
            .map(|fit| format!("Fit {:.2} | ", fit))
            .unwrap_or_default();
        writeln!(
            out,
            "    {}Est. Rent {}/mo ({}, comps={}) | Down Payment Used {}",
            fit,
            dollars(result.rent.monthly_rent),
            result.rent.source_used,
            result.rent.comp_count,
            dollars(result.down_payment)
        )?;
        writeln!(
            out,
            "    Costs/mo: P&I {}, Tax {}, Ins {}, Maint {}, Mgmt {}, Vacancy {}, PMI {}, HOA {}",
            dollars(cashflow.principal_interest),
            dollars(cashflow.property_tax),
            dollars(cashflow.insurance),
            dollars(cashflow.maintenance),
            dollars(cashflow.management_fee),
            dollars(cashflow.vacancy_reserve),
            dollars(cashflow.pmi),
            dollars(cashflow.hoa)
        )?;

        let cash_on_cash = result
            .cash_on_cash_return
            .map_or_else(|| "n/a".to_string(), |value| format!("{value:.2}%/yr"));
        writeln!(
            out,
            "    Net: {}/mo | Cash-on-Cash: {}",
            dollars(cashflow.net_cashflow),
            cash_on_cash
        )?;
        if let Some(url) = listing.listing_url.as_deref().filter(|url| !url.is_empty()) {
            writeln!(out, "    {url}")?;
        }
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    }

    Ok(())
}

fn optional(value: Option<f64>, format: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "?".to_string(), format)
}

fn dollars(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", grouped(-value))
    } else {
        format!("${}", grouped(value))
    }
}

/// Whole-number rendering with thousands separators.
fn grouped(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if value < 0.0 && digits != "0" {
        out.insert(0, '-');
    }
    out
}
