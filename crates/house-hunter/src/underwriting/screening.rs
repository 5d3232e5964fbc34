use super::assumptions::FinancingAssumptions;
use super::domain::Listing;
use std::collections::BTreeSet;

/// Geographic restriction parsed from a free-form location string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationFilter {
    Zip(String),
    State(String),
    City { city: String, state: Option<String> },
}

impl LocationFilter {
    /// `78704` is a ZIP, `TX` a state, anything else `City[, ST]`.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.len() == 5 && normalized.bytes().all(|byte| byte.is_ascii_digit()) {
            return Self::Zip(normalized);
        }
        if normalized.len() == 2 && normalized.bytes().all(|byte| byte.is_ascii_alphabetic()) {
            return Self::State(normalized);
        }

        match normalized.split_once(',') {
            Some((city, state)) => {
                let state: String = state.trim().chars().take(2).collect();
                Self::City {
                    city: city.trim().to_string(),
                    state: (!state.is_empty()).then_some(state),
                }
            }
            None => Self::City {
                city: normalized,
                state: None,
            },
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        let listing_state = listing.state.trim().to_ascii_uppercase();
        match self {
            Self::Zip(zip) => listing.normalized_zip() == Some(zip.as_str()),
            Self::State(state) => listing_state == *state,
            Self::City { city, state } => {
                listing.city.trim().to_ascii_uppercase() == *city
                    && state.as_ref().map_or(true, |state| listing_state == *state)
            }
        }
    }
}

/// Buyer-side filters applied before any underwriting work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub location: Option<LocationFilter>,
    pub min_bedrooms: f64,
    pub min_bathrooms: f64,
    /// Lower-cased property types; empty accepts all.
    pub property_types: BTreeSet<String>,
}

impl ListingFilter {
    pub fn with_property_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.property_types = types
            .into_iter()
            .map(|value| value.as_ref().trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .collect();
        self
    }

    pub fn accepts(&self, listing: &Listing) -> bool {
        if let Some(location) = &self.location {
            if !location.matches(listing) {
                return false;
            }
        }

        if listing.bedrooms.unwrap_or(0.0) < self.min_bedrooms
            || listing.bathrooms.unwrap_or(0.0) < self.min_bathrooms
        {
            return false;
        }

        if self.property_types.is_empty() {
            return true;
        }
        listing
            .property_type
            .as_deref()
            .map(|kind| self.property_types.contains(&kind.trim().to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

/// Why a listing never reached rent estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    FilteredOut,
    InvalidPrice,
    OverMaxPrice { price: f64, max_price: f64 },
    DownPaymentUnaffordable { required: f64, available: f64 },
    NoDownPayment,
}

/// Cheap budget feasibility check against the run's financing limits.
pub fn screen_budget(
    listing: &Listing,
    assumptions: &FinancingAssumptions,
) -> Result<(), Rejection> {
    let price = listing.price;
    if !price.is_finite() || price <= 0.0 {
        return Err(Rejection::InvalidPrice);
    }
    if price > assumptions.max_price() {
        return Err(Rejection::OverMaxPrice {
            price,
            max_price: assumptions.max_price(),
        });
    }

    let required = assumptions.required_down_payment(price);
    if required > assumptions.max_down_payment() {
        return Err(Rejection::DownPaymentUnaffordable {
            required,
            available: assumptions.max_down_payment(),
        });
    }
    if assumptions.down_payment_for(price) <= 0.0 {
        return Err(Rejection::NoDownPayment);
    }

    Ok(())
}

/// Collapses street-suffix spellings so duplicates of one property share a key.
pub(crate) fn normalize_address_key(address: &str) -> String {
    const SUFFIXES: [(&str, &str); 10] = [
        ("street", "st"),
        ("road", "rd"),
        ("drive", "dr"),
        ("avenue", "ave"),
        ("lane", "ln"),
        ("boulevard", "blvd"),
        ("court", "ct"),
        ("trail", "trl"),
        ("place", "pl"),
        ("way", "wy"),
    ];

    let collapsed: String = address
        .to_lowercase()
        .split_whitespace()
        .map(|token| {
            let bare = token.trim_end_matches(&['.', ','][..]);
            SUFFIXES
                .iter()
                .find(|(long, short)| bare == *long || bare == *short)
                .map_or(bare, |(_, short)| *short)
                .to_string()
        })
        .collect();

    collapsed
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
