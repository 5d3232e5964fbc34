use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration defect detected while constructing an assumption set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssumptionError {
    #[error("{field} must be a finite non-negative number (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("loan term must be at least one month")]
    ZeroTerm,
    #[error("down payment {down_payment} exceeds max down payment {max_down_payment}")]
    DownPaymentAboveMax {
        down_payment: f64,
        max_down_payment: f64,
    },
    #[error("{field} must be a fraction between 0 and 1 (got {value})")]
    NotAFraction { field: &'static str, value: f64 },
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, AssumptionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AssumptionError::Negative { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, AssumptionError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(AssumptionError::NotPositive { field, value })
    }
}

fn fraction(field: &'static str, value: f64) -> Result<f64, AssumptionError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(AssumptionError::NotAFraction { field, value })
    }
}

/// Relative importance of each attribute when comparing two properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreferenceWeights {
    sqft: f64,
    bedrooms: f64,
    bathrooms: f64,
    year_built: f64,
    lot_size: f64,
}

impl PreferenceWeights {
    pub fn new(
        sqft: f64,
        bedrooms: f64,
        bathrooms: f64,
        year_built: f64,
        lot_size: f64,
    ) -> Result<Self, AssumptionError> {
        Ok(Self {
            sqft: non_negative("weight_sqft", sqft)?,
            bedrooms: non_negative("weight_bedrooms", bedrooms)?,
            bathrooms: non_negative("weight_bathrooms", bathrooms)?,
            year_built: non_negative("weight_year_built", year_built)?,
            lot_size: non_negative("weight_lot_size", lot_size)?,
        })
    }

    pub fn sqft(&self) -> f64 {
        self.sqft
    }

    pub fn bedrooms(&self) -> f64 {
        self.bedrooms
    }

    pub fn bathrooms(&self) -> f64 {
        self.bathrooms
    }

    pub fn year_built(&self) -> f64 {
        self.year_built
    }

    pub fn lot_size(&self) -> f64 {
        self.lot_size
    }
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            sqft: 3.0,
            bedrooms: 2.0,
            bathrooms: 2.0,
            year_built: 1.5,
            lot_size: 1.0,
        }
    }
}

/// Effective annual property-tax rates applied to purchase price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTaxRates {
    pub default_rate: f64,
    pub by_state: BTreeMap<String, f64>,
}

impl PropertyTaxRates {
    pub fn flat(rate: f64) -> Self {
        Self {
            default_rate: rate,
            by_state: BTreeMap::new(),
        }
    }

    /// Published state averages; states not listed use 1.1%.
    pub fn standard() -> Self {
        const STATE_RATES: [(&str, f64); 50] = [
            ("AL", 0.0040),
            ("AK", 0.0119),
            ("AZ", 0.0063),
            ("AR", 0.0064),
            ("CA", 0.0075),
            ("CO", 0.0049),
            ("CT", 0.0185),
            ("DE", 0.0055),
            ("FL", 0.0090),
            ("GA", 0.0092),
            ("HI", 0.0031),
            ("ID", 0.0067),
            ("IL", 0.0215),
            ("IN", 0.0085),
            ("IA", 0.0157),
            ("KS", 0.0141),
            ("KY", 0.0083),
            ("LA", 0.0051),
            ("ME", 0.0119),
            ("MD", 0.0106),
            ("MA", 0.0117),
            ("MI", 0.0154),
            ("MN", 0.0110),
            ("MS", 0.0081),
            ("MO", 0.0099),
            ("MT", 0.0083),
            ("NE", 0.0161),
            ("NV", 0.0060),
            ("NH", 0.0186),
            ("NJ", 0.0223),
            ("NM", 0.0067),
            ("NY", 0.0172),
            ("NC", 0.0081),
            ("ND", 0.0100),
            ("OH", 0.0156),
            ("OK", 0.0090),
            ("OR", 0.0100),
            ("PA", 0.0149),
            ("RI", 0.0137),
            ("SC", 0.0056),
            ("SD", 0.0122),
            ("TN", 0.0064),
            ("TX", 0.0180),
            ("UT", 0.0056),
            ("VT", 0.0178),
            ("VA", 0.0082),
            ("WA", 0.0092),
            ("WV", 0.0059),
            ("WI", 0.0176),
            ("WY", 0.0058),
        ];

        Self {
            default_rate: 0.011,
            by_state: STATE_RATES
                .iter()
                .map(|(state, rate)| (state.to_string(), *rate))
                .collect(),
        }
    }

    pub fn rate_for(&self, state: &str) -> f64 {
        self.by_state
            .get(state.trim().to_ascii_uppercase().as_str())
            .copied()
            .unwrap_or(self.default_rate)
    }

    fn validate(&self) -> Result<(), AssumptionError> {
        non_negative("property_tax_rate", self.default_rate)?;
        for rate in self.by_state.values() {
            non_negative("property_tax_rate", *rate)?;
        }
        Ok(())
    }
}

impl Default for PropertyTaxRates {
    fn default() -> Self {
        Self::standard()
    }
}

/// Insurance premium model; cost varies too much by geography for a single formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceCost {
    FlatMonthly(f64),
    RateOfPrice {
        annual_rate: f64,
        /// Uplift from a homeowner policy toward a landlord policy.
        landlord_multiplier: f64,
        state_factors: BTreeMap<String, f64>,
    },
}

impl InsuranceCost {
    /// 0.35% of price, 1.15x landlord uplift, and regional surcharges for high-risk states.
    pub fn standard() -> Self {
        let state_factors = [
            ("CA", 1.15),
            ("FL", 1.35),
            ("TX", 1.25),
            ("LA", 1.3),
            ("CO", 1.15),
            ("OK", 1.2),
            ("NY", 1.1),
        ]
        .iter()
        .map(|(state, factor)| (state.to_string(), *factor))
        .collect();

        Self::RateOfPrice {
            annual_rate: 0.0035,
            landlord_multiplier: 1.15,
            state_factors,
        }
    }

    pub fn monthly(&self, price: f64, state: &str) -> f64 {
        match self {
            Self::FlatMonthly(amount) => *amount,
            Self::RateOfPrice {
                annual_rate,
                landlord_multiplier,
                state_factors,
            } => {
                let factor = state_factors
                    .get(state.trim().to_ascii_uppercase().as_str())
                    .copied()
                    .unwrap_or(1.0);
                price * annual_rate * landlord_multiplier * factor / 12.0
            }
        }
    }

    fn validate(&self) -> Result<(), AssumptionError> {
        match self {
            Self::FlatMonthly(amount) => {
                non_negative("insurance_monthly", *amount)?;
            }
            Self::RateOfPrice {
                annual_rate,
                landlord_multiplier,
                state_factors,
            } => {
                non_negative("insurance_rate", *annual_rate)?;
                non_negative("landlord_insurance_multiplier", *landlord_multiplier)?;
                for factor in state_factors.values() {
                    non_negative("insurance_state_factor", *factor)?;
                }
            }
        }
        Ok(())
    }
}

/// Inputs accepted by [`FinancingAssumptions::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct FinancingTerms {
    pub mortgage_rate: f64,
    pub term_months: u32,
    pub insurance: InsuranceCost,
    pub maintenance_rate: f64,
    pub management_rate: f64,
    pub vacancy_rate: f64,
    pub pmi_rate: f64,
    pub max_price: f64,
    pub max_down_payment: f64,
    pub down_payment: Option<f64>,
    pub min_down_payment_pct: f64,
    pub property_tax: PropertyTaxRates,
}

impl Default for FinancingTerms {
    fn default() -> Self {
        Self {
            mortgage_rate: 0.0675,
            term_months: 360,
            insurance: InsuranceCost::standard(),
            maintenance_rate: 0.01,
            management_rate: 0.10,
            vacancy_rate: 0.05,
            pmi_rate: 0.0,
            max_price: 0.0,
            max_down_payment: 0.0,
            down_payment: None,
            min_down_payment_pct: 0.0,
            property_tax: PropertyTaxRates::standard(),
        }
    }
}

/// Validated, immutable financing and operating assumptions for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancingAssumptions {
    terms: FinancingTerms,
}

impl FinancingAssumptions {
    pub fn new(terms: FinancingTerms) -> Result<Self, AssumptionError> {
        non_negative("mortgage_rate", terms.mortgage_rate)?;
        if terms.term_months == 0 {
            return Err(AssumptionError::ZeroTerm);
        }
        terms.insurance.validate()?;
        non_negative("maintenance_rate", terms.maintenance_rate)?;
        non_negative("management_rate", terms.management_rate)?;
        non_negative("vacancy_rate", terms.vacancy_rate)?;
        non_negative("pmi_rate", terms.pmi_rate)?;
        positive("max_price", terms.max_price)?;
        non_negative("max_down_payment", terms.max_down_payment)?;
        fraction("min_down_payment_pct", terms.min_down_payment_pct)?;
        terms.property_tax.validate()?;

        if let Some(down_payment) = terms.down_payment {
            non_negative("down_payment", down_payment)?;
            if down_payment > terms.max_down_payment {
                return Err(AssumptionError::DownPaymentAboveMax {
                    down_payment,
                    max_down_payment: terms.max_down_payment,
                });
            }
        }

        Ok(Self { terms })
    }

    pub fn terms(&self) -> &FinancingTerms {
        &self.terms
    }

    pub fn mortgage_rate(&self) -> f64 {
        self.terms.mortgage_rate
    }

    pub fn term_months(&self) -> u32 {
        self.terms.term_months
    }

    pub fn max_price(&self) -> f64 {
        self.terms.max_price
    }

    pub fn max_down_payment(&self) -> f64 {
        self.terms.max_down_payment
    }

    /// Cash the lender requires up front for a listing at `price`.
    pub fn required_down_payment(&self, price: f64) -> f64 {
        price * self.terms.min_down_payment_pct
    }

    /// Down payment actually used for `price`: the chosen amount, raised to the
    /// lender minimum and capped at the price itself.
    pub fn down_payment_for(&self, price: f64) -> f64 {
        let chosen = self
            .terms
            .down_payment
            .unwrap_or(self.terms.max_down_payment);
        chosen.max(self.required_down_payment(price)).min(price).max(0.0)
    }
}

/// Coefficients for the formula rent used when no comp evidence qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicRentModel {
    pub base_rent_per_sqft: f64,
    pub state_multipliers: BTreeMap<String, f64>,
    pub default_sqft: f64,
    pub bedroom_premium: f64,
    pub bathroom_premium: f64,
    /// Fraction of rent lost per year of age.
    pub depreciation_per_year: f64,
    /// Lowest multiplier age can push the rent down to.
    pub depreciation_floor: f64,
    pub minimum_rent: f64,
    pub reference_year: i32,
}

impl HeuristicRentModel {
    pub fn standard(reference_year: i32) -> Self {
        let state_multipliers = [
            ("CA", 1.45),
            ("NY", 1.4),
            ("WA", 1.25),
            ("MA", 1.3),
            ("TX", 1.0),
            ("FL", 1.05),
            ("GA", 0.95),
            ("OH", 0.85),
            ("PA", 0.9),
        ]
        .iter()
        .map(|(state, multiplier)| (state.to_string(), *multiplier))
        .collect();

        Self {
            base_rent_per_sqft: 1.2,
            state_multipliers,
            default_sqft: 1200.0,
            bedroom_premium: 85.0,
            bathroom_premium: 60.0,
            depreciation_per_year: 0.002,
            depreciation_floor: 0.85,
            minimum_rent: 900.0,
            reference_year,
        }
    }

    pub fn validate(&self) -> Result<(), AssumptionError> {
        positive("base_rent_per_sqft", self.base_rent_per_sqft)?;
        positive("default_sqft", self.default_sqft)?;
        non_negative("bedroom_premium", self.bedroom_premium)?;
        non_negative("bathroom_premium", self.bathroom_premium)?;
        non_negative("depreciation_per_year", self.depreciation_per_year)?;
        fraction("depreciation_floor", self.depreciation_floor)?;
        positive("minimum_rent", self.minimum_rent)?;
        for multiplier in self.state_multipliers.values() {
            positive("state_rent_multiplier", *multiplier)?;
        }
        Ok(())
    }

    pub fn state_multiplier(&self, state: &str) -> f64 {
        self.state_multipliers
            .get(state.trim().to_ascii_uppercase().as_str())
            .copied()
            .unwrap_or(1.0)
    }
}
