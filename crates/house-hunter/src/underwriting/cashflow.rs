use super::assumptions::FinancingAssumptions;
use super::domain::{CashflowBreakdown, Listing, RentEstimate};

/// Down payment share below which lenders charge private mortgage insurance.
const PMI_DOWN_PAYMENT_THRESHOLD: f64 = 0.2;

/// Derives monthly cost lines and net cashflow for a listing already within budget.
pub struct CashflowCalculator;

impl CashflowCalculator {
    pub fn compute(
        listing: &Listing,
        rent: &RentEstimate,
        assumptions: &FinancingAssumptions,
    ) -> CashflowBreakdown {
        let terms = assumptions.terms();
        let price = listing.price;
        let monthly_rent = rent.monthly_rent;

        let down_payment = assumptions.down_payment_for(price);
        let loan = (price - down_payment).max(0.0);

        let principal_interest =
            mortgage_payment(loan, assumptions.mortgage_rate(), assumptions.term_months());
        let property_tax = price * terms.property_tax.rate_for(&listing.state) / 12.0;
        let insurance = terms.insurance.monthly(price, &listing.state);
        let maintenance = terms.maintenance_rate * price / 12.0;
        let management_fee = terms.management_rate * monthly_rent;
        let vacancy_reserve = terms.vacancy_rate * monthly_rent;
        let hoa = listing.hoa_monthly;

        let pmi = if loan > 0.0 && price > 0.0 && down_payment / price < PMI_DOWN_PAYMENT_THRESHOLD
        {
            loan * terms.pmi_rate / 12.0
        } else {
            0.0
        };

        let total_costs = principal_interest
            + property_tax
            + insurance
            + maintenance
            + management_fee
            + vacancy_reserve
            + hoa
            + pmi;

        CashflowBreakdown {
            rent: monthly_rent,
            principal_interest,
            property_tax,
            insurance,
            maintenance,
            management_fee,
            vacancy_reserve,
            hoa,
            pmi,
            total_costs,
            net_cashflow: monthly_rent - total_costs,
        }
    }
}

/// Fixed-rate amortized monthly payment on `loan` at `annual_rate` over `term_months`.
pub fn mortgage_payment(loan: f64, annual_rate: f64, term_months: u32) -> f64 {
    if loan <= 0.0 || term_months == 0 {
        return 0.0;
    }

    let n = f64::from(term_months);
    let r = annual_rate / 12.0;
    if r == 0.0 {
        return loan / n;
    }

    let growth = (1.0 + r).powf(n);
    loan * r * growth / (growth - 1.0)
}
