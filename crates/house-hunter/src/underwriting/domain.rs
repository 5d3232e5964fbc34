use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One for-sale property under consideration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub listing_id: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub price: f64,
    pub sqft: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub year_built: Option<i32>,
    pub lot_size_sqft: Option<f64>,
    #[serde(default)]
    pub hoa_monthly: f64,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub listing_url: Option<String>,
}

impl Listing {
    /// Five-digit ZIP, or `None` when the stored value cannot match any comp.
    pub fn normalized_zip(&self) -> Option<&str> {
        normalize_zip(&self.zip_code)
    }

    pub fn attributes(&self) -> PropertyAttributes {
        PropertyAttributes {
            sqft: self.sqft,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            year_built: self.year_built.map(f64::from),
            lot_size_sqft: self.lot_size_sqft,
        }
    }
}

/// An observed rental used as evidence for a listing's achievable rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalComp {
    pub comp_id: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub monthly_rent: Option<f64>,
    pub sqft: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub year_built: Option<i32>,
    pub lot_size_sqft: Option<f64>,
}

impl RentalComp {
    pub fn normalized_zip(&self) -> Option<&str> {
        normalize_zip(&self.zip_code)
    }

    /// Rent usable for weighting; missing, non-finite, or non-positive rents are rejected.
    pub fn usable_rent(&self) -> Option<f64> {
        self.monthly_rent
            .filter(|rent| rent.is_finite() && *rent > 0.0)
    }

    pub fn attributes(&self) -> PropertyAttributes {
        PropertyAttributes {
            sqft: self.sqft,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            year_built: self.year_built.map(f64::from),
            lot_size_sqft: self.lot_size_sqft,
        }
    }
}

/// Physical characteristics compared by the similarity scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyAttributes {
    pub sqft: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub year_built: Option<f64>,
    pub lot_size_sqft: Option<f64>,
}

/// Desired home used to rate how well each listing fits the buyer.
pub type TargetHome = PropertyAttributes;

/// Accepts `12345` or `12345-6789`; both normalize to the five-digit prefix.
pub(crate) fn normalize_zip(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let (head, tail) = match trimmed.split_once('-') {
        Some((head, tail)) => (head, Some(tail)),
        None => (trimmed, None),
    };

    let is_digits = |value: &str, len: usize| {
        value.len() == len && value.bytes().all(|byte| byte.is_ascii_digit())
    };

    if !is_digits(head, 5) {
        return None;
    }
    match tail {
        Some(plus_four) if !is_digits(plus_four, 4) => None,
        _ => Some(head),
    }
}

/// Rent evidence policy requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RentSource {
    Heuristic,
    Csv,
    RapidApiRealtor,
    #[default]
    Hybrid,
}

impl RentSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Csv => "csv",
            Self::RapidApiRealtor => "rapidapi-realtor",
            Self::Hybrid => "hybrid",
        }
    }

    /// Comp origins tried in order before the heuristic formula.
    pub const fn origins(self) -> &'static [CompOrigin] {
        match self {
            Self::Heuristic => &[],
            Self::Csv => &[CompOrigin::Csv],
            Self::RapidApiRealtor => &[CompOrigin::RapidApi],
            Self::Hybrid => &[CompOrigin::Csv, CompOrigin::RapidApi],
        }
    }

    pub const fn uses_csv_comps(self) -> bool {
        matches!(self, Self::Csv | Self::Hybrid)
    }

    pub const fn uses_api_comps(self) -> bool {
        matches!(self, Self::RapidApiRealtor | Self::Hybrid)
    }
}

impl fmt::Display for RentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rent source '{0}' (expected heuristic, csv, rapidapi-realtor, or hybrid)")]
pub struct UnknownRentSource(pub String);

impl FromStr for RentSource {
    type Err = UnknownRentSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "csv" => Ok(Self::Csv),
            "rapidapi-realtor" => Ok(Self::RapidApiRealtor),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(UnknownRentSource(other.to_string())),
        }
    }
}

/// Where a comp set was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompOrigin {
    Csv,
    RapidApi,
}

/// Branch of the estimator that produced a rent figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimateSource {
    Csv,
    RapidApiRealtor,
    /// Heuristic requested explicitly.
    Heuristic,
    /// Heuristic reached because no comp origin produced enough comps.
    HeuristicFallback,
}

impl EstimateSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::RapidApiRealtor => "rapidapi-realtor",
            Self::Heuristic => "heuristic",
            Self::HeuristicFallback => "heuristic-fallback",
        }
    }
}

impl From<CompOrigin> for EstimateSource {
    fn from(origin: CompOrigin) -> Self {
        match origin {
            CompOrigin::Csv => Self::Csv,
            CompOrigin::RapidApi => Self::RapidApiRealtor,
        }
    }
}

impl fmt::Display for EstimateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RentEstimate {
    pub monthly_rent: f64,
    pub source_used: EstimateSource,
    pub comp_count: usize,
}

/// Monthly cost lines and the resulting net; all values are signed currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashflowBreakdown {
    pub rent: f64,
    pub principal_interest: f64,
    pub property_tax: f64,
    pub insurance: f64,
    pub maintenance: f64,
    pub management_fee: f64,
    pub vacancy_reserve: f64,
    pub hoa: f64,
    pub pmi: f64,
    pub total_costs: f64,
    pub net_cashflow: f64,
}

/// Pipeline output for one listing that survived screening and the cashflow filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Underwriting {
    pub listing: Listing,
    pub rent: RentEstimate,
    pub cashflow: CashflowBreakdown,
    pub down_payment: f64,
    pub loan_amount: f64,
    /// Annual net cashflow over the down payment, as a percentage.
    pub cash_on_cash_return: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_fit: Option<f64>,
}
