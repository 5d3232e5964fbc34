//! Mapping for RapidAPI realtor search payloads.
//!
//! Providers behind the same endpoint disagree on field placement, so every
//! attribute is read from a list of candidate paths and the first present
//! value wins.

use super::parse_amount;
use crate::underwriting::domain::{Listing, RentalComp};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static MISSING: Value = Value::Null;

/// Result objects from any of the known payload envelopes.
pub fn extract_results(payload: &Value) -> Vec<&Value> {
    let candidates = [
        payload.pointer("/data/home_search/results"),
        payload.pointer("/data/results"),
        payload.get("properties"),
        payload.get("results"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_array)
        .find(|results| !results.is_empty())
        .map(|results| results.iter().filter(|item| item.is_object()).collect())
        .unwrap_or_default()
}

/// Sale listing from one result; `None` when the item carries no usable price.
pub fn listing_from_value(item: &Value) -> Option<Listing> {
    let fields = ItemFields::new(item)?;
    let price = fields.price().filter(|price| *price > 0.0)?;

    Some(Listing {
        listing_id: fields.id(),
        address: fields.line.clone(),
        city: fields.city(),
        state: fields.state(),
        zip_code: fields.zip.clone(),
        price,
        sqft: fields.attribute("sqft", "sqft"),
        bedrooms: fields.attribute("beds", "beds"),
        bathrooms: fields.attribute("baths", "baths"),
        year_built: fields.year_built(),
        lot_size_sqft: fields.attribute("lot_sqft", "lot_sqft"),
        hoa_monthly: extract_hoa_monthly(item, fields.description),
        property_type: text(first_present([
            fields.description.get("type"),
            fields.description.get("property_type"),
            item.get("prop_type"),
        ])),
        listing_url: text(first_present([
            item.get("href"),
            item.get("permalink"),
            item.get("rdc_web_url"),
        ])),
    })
}

/// Rental comp from a for-rent result; the asking rent sits where sale payloads put the price.
pub fn rental_comp_from_value(item: &Value) -> Option<RentalComp> {
    let fields = ItemFields::new(item)?;

    Some(RentalComp {
        comp_id: fields.id(),
        address: fields.line.clone(),
        city: fields.city(),
        state: fields.state(),
        zip_code: fields.zip.clone(),
        monthly_rent: fields.price(),
        sqft: fields.attribute("sqft", "sqft"),
        bedrooms: fields.attribute("beds", "beds"),
        bathrooms: fields.attribute("baths", "baths"),
        year_built: fields.year_built(),
        lot_size_sqft: fields.attribute("lot_sqft", "lot_sqft"),
    })
}

struct ItemFields<'a> {
    item: &'a Value,
    address: &'a Value,
    description: &'a Value,
    line: String,
    zip: String,
}

impl<'a> ItemFields<'a> {
    fn new(item: &'a Value) -> Option<Self> {
        if !item.is_object() {
            return None;
        }
        let address = item.pointer("/location/address").unwrap_or(&MISSING);
        let description = item.get("description").unwrap_or(&MISSING);

        let line = text(first_present([
            address.get("line"),
            address.get("street_name"),
            item.get("address"),
        ]))
        .unwrap_or_default();
        let zip = text(first_present([
            address.get("postal_code"),
            item.get("postal_code"),
            item.get("zip_code"),
        ]))
        .unwrap_or_default();

        Some(Self {
            item,
            address,
            description,
            line,
            zip,
        })
    }

    fn id(&self) -> String {
        text(first_present([
            self.item.get("property_id"),
            self.item.get("listing_id"),
        ]))
        .unwrap_or_else(|| format!("{}-{}", self.line, self.zip))
    }

    fn city(&self) -> String {
        text(first_present([self.address.get("city"), self.item.get("city")])).unwrap_or_default()
    }

    fn state(&self) -> String {
        text(first_present([
            self.address.get("state_code"),
            self.address.get("state"),
            self.item.get("state"),
        ]))
        .unwrap_or_default()
        .to_ascii_uppercase()
    }

    fn price(&self) -> Option<f64> {
        number(first_present([
            self.item.get("list_price"),
            self.description.get("price"),
            self.item.get("price"),
        ]))
    }

    fn attribute(&self, description_key: &str, item_key: &str) -> Option<f64> {
        number(first_present([
            self.description.get(description_key),
            self.item.get(item_key),
        ]))
        .filter(|value| *value > 0.0)
    }

    fn year_built(&self) -> Option<i32> {
        self.attribute("year_built", "year_built")
            .map(f64::trunc)
            .filter(|year| *year <= 9999.0)
            .map(|year| year as i32)
    }
}

/// Monthly HOA dues, trying flat fields, nested fee objects, then listing remarks.
pub fn extract_hoa_monthly(item: &Value, description: &Value) -> f64 {
    const FLAT_KEYS: [&str; 4] = ["hoa_fee", "hoa", "monthly_hoa_fee", "hoa_monthly"];

    let flat = FLAT_KEYS
        .iter()
        .map(|key| item.get(*key))
        .chain(FLAT_KEYS.iter().map(|key| description.get(*key)))
        .chain([
            item.get("hoa_fee_per_month"),
            description.get("hoa_fee_per_month"),
        ]);
    if let Some(amount) = flat.filter_map(number).find(|amount| *amount > 0.0) {
        return amount;
    }

    let nested = [
        item.get("hoa"),
        description.get("hoa"),
        item.get("association"),
        description.get("association"),
    ]
    .into_iter()
    .flatten()
    .find(|value| value.is_object());
    if let Some(nested) = nested {
        let monthly = number(first_present([
            nested.get("monthly_fee"),
            nested.get("fee_monthly"),
            nested.get("hoa_fee"),
            nested.get("fee"),
        ]));
        if let Some(amount) = monthly.filter(|amount| *amount > 0.0) {
            return amount;
        }

        let annual = number(first_present([
            nested.get("annual_fee"),
            nested.get("yearly_fee"),
            nested.get("fee_annual"),
        ]));
        if let Some(amount) = annual.filter(|amount| *amount > 0.0) {
            return amount / 12.0;
        }
    }

    let remarks = [
        item.get("remarks"),
        description.get("text"),
        description.get("description"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .collect::<Vec<_>>()
    .join(" ");
    hoa_from_remarks(&remarks).unwrap_or(0.0)
}

/// Matches text like `HOA: $250/mo` or `hoa dues 1,200 / yr`.
fn hoa_remarks_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)hoa[^$\d]{0,24}\$?([\d,]{2,7})(?:\s*/\s*(mo|month|yr|year))?").ok()
        })
        .as_ref()
}

fn hoa_from_remarks(remarks: &str) -> Option<f64> {
    let captures = hoa_remarks_pattern()?.captures(remarks)?;
    let amount = parse_amount(captures.get(1)?.as_str()).filter(|amount| *amount > 0.0)?;
    let annual = captures
        .get(2)
        .map(|cadence| cadence.as_str().to_ascii_lowercase().starts_with('y'))
        .unwrap_or(false);

    Some(if annual { amount / 12.0 } else { amount })
}

fn first_present<'a, const N: usize>(candidates: [Option<&'a Value>; N]) -> Option<&'a Value> {
    candidates.into_iter().flatten().find(|value| match value {
        Value::Null => false,
        Value::String(raw) => !raw.trim().is_empty(),
        _ => true,
    })
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        Value::String(raw) => parse_amount(raw),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(raw) => Some(raw.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sale_item() -> Value {
        json!({
            "property_id": "9012345678",
            "list_price": 289000,
            "href": "https://www.realtor.com/realestateandhomes-detail/9012345678",
            "location": {
                "address": {
                    "line": "418 Maple Ave",
                    "city": "Dayton",
                    "state_code": "oh",
                    "postal_code": "45402"
                }
            },
            "description": {
                "sqft": 1640,
                "beds": 3,
                "baths": "2",
                "year_built": 1958,
                "lot_sqft": null,
                "type": "single_family"
            }
        })
    }

    #[test]
    fn extracts_results_from_nested_envelopes() {
        let payload = json!({"data": {"home_search": {"results": [sale_item(), "junk"]}}});
        assert_eq!(extract_results(&payload).len(), 1);

        let flat = json!({"properties": [sale_item()]});
        assert_eq!(extract_results(&flat).len(), 1);

        assert!(extract_results(&json!({"status": 200})).is_empty());
    }

    #[test]
    fn maps_sale_listing_fields() {
        let listing = listing_from_value(&sale_item()).expect("listing with price");

        assert_eq!(listing.listing_id, "9012345678");
        assert_eq!(listing.address, "418 Maple Ave");
        assert_eq!(listing.state, "OH");
        assert_eq!(listing.zip_code, "45402");
        assert_eq!(listing.price, 289_000.0);
        assert_eq!(listing.bathrooms, Some(2.0));
        assert_eq!(listing.year_built, Some(1958));
        assert_eq!(listing.lot_size_sqft, None);
        assert_eq!(listing.hoa_monthly, 0.0);
        assert_eq!(listing.property_type.as_deref(), Some("single_family"));
    }

    #[test]
    fn listing_without_price_is_skipped() {
        let mut item = sale_item();
        item["list_price"] = json!(0);
        assert!(listing_from_value(&item).is_none());
    }

    #[test]
    fn missing_ids_fall_back_to_address_and_zip() {
        let item = json!({
            "list_price": 1850,
            "location": {"address": {"line": "7 Pine Ct", "postal_code": "45402"}}
        });
        let comp = rental_comp_from_value(&item).expect("object item");
        assert_eq!(comp.comp_id, "7 Pine Ct-45402");
        assert_eq!(comp.monthly_rent, Some(1850.0));
    }

    #[test]
    fn hoa_prefers_flat_then_nested_then_remarks() {
        let flat = json!({"hoa_fee": "145"});
        assert_eq!(extract_hoa_monthly(&flat, &Value::Null), 145.0);

        let annual = json!({"association": {"annual_fee": 1800}});
        assert_eq!(extract_hoa_monthly(&annual, &Value::Null), 150.0);

        let remarks = json!({"remarks": "Quiet street. HOA dues: $2,400 / yr covers snow removal."});
        assert_eq!(extract_hoa_monthly(&remarks, &Value::Null), 200.0);

        let monthly_text = json!({"text": "Low hoa $95/mo"});
        assert_eq!(extract_hoa_monthly(&Value::Null, &monthly_text), 95.0);

        let none = json!({"remarks": "No association. Shoal creek frontage."});
        assert_eq!(extract_hoa_monthly(&none, &Value::Null), 0.0);
    }

    #[test]
    fn remarks_hoa_needs_a_nearby_amount_and_reads_cadence_case_insensitively() {
        assert_eq!(hoa_from_remarks("HOA fee 1,800 / YEAR"), Some(150.0));
        assert_eq!(hoa_from_remarks("Hoa $125 / Month, water included"), Some(125.0));
        assert_eq!(
            hoa_from_remarks("hoa is included in a very long sentence $300"),
            None
        );
        assert_eq!(hoa_from_remarks("HOA: $5"), None);
    }
}
