//! JSON recalibration of the built-in rent and tax tables.
//!
//! A calibration file only lists what it changes:
//!
//! ```json
//! {
//!   "heuristic": { "base_rent_per_sqft": 1.35, "state_multipliers": { "OH": 0.9 } },
//!   "property_tax": { "by_state": { "TX": 0.0175 } }
//! }
//! ```

use super::ConfigError;
use crate::underwriting::{HeuristicRentModel, PropertyTaxRates};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Calibration {
    pub heuristic: HeuristicRentOverrides,
    pub property_tax: PropertyTaxOverrides,
}

impl Calibration {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::CalibrationRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            ConfigError::CalibrationParse {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// Coefficients replacing those of [`HeuristicRentModel::standard`]. The
/// reference year is never read from file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeuristicRentOverrides {
    pub base_rent_per_sqft: Option<f64>,
    /// Merged into the built-in table; states keep their defaults unless named.
    pub state_multipliers: BTreeMap<String, f64>,
    pub default_sqft: Option<f64>,
    pub bedroom_premium: Option<f64>,
    pub bathroom_premium: Option<f64>,
    pub depreciation_per_year: Option<f64>,
    pub depreciation_floor: Option<f64>,
    pub minimum_rent: Option<f64>,
}

impl HeuristicRentOverrides {
    pub fn apply(&self, mut model: HeuristicRentModel) -> HeuristicRentModel {
        overlay(&mut model.base_rent_per_sqft, self.base_rent_per_sqft);
        overlay(&mut model.default_sqft, self.default_sqft);
        overlay(&mut model.bedroom_premium, self.bedroom_premium);
        overlay(&mut model.bathroom_premium, self.bathroom_premium);
        overlay(&mut model.depreciation_per_year, self.depreciation_per_year);
        overlay(&mut model.depreciation_floor, self.depreciation_floor);
        overlay(&mut model.minimum_rent, self.minimum_rent);
        model
            .state_multipliers
            .extend(upper_cased(&self.state_multipliers));
        model
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyTaxOverrides {
    pub default_rate: Option<f64>,
    pub by_state: BTreeMap<String, f64>,
}

impl PropertyTaxOverrides {
    pub fn apply(&self, mut rates: PropertyTaxRates) -> PropertyTaxRates {
        overlay(&mut rates.default_rate, self.default_rate);
        rates.by_state.extend(upper_cased(&self.by_state));
        rates
    }
}

fn overlay(slot: &mut f64, value: Option<f64>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn upper_cased(table: &BTreeMap<String, f64>) -> impl Iterator<Item = (String, f64)> + '_ {
    table
        .iter()
        .map(|(state, value)| (state.trim().to_ascii_uppercase(), *value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::underwriting::Listing;

    fn listing() -> Listing {
        Listing {
            listing_id: "L-7".to_string(),
            address: "8 Elm St".to_string(),
            city: "Toledo".to_string(),
            state: "OH".to_string(),
            zip_code: "43604".to_string(),
            price: 140_000.0,
            sqft: Some(1500.0),
            bedrooms: Some(3.0),
            bathrooms: Some(1.0),
            year_built: Some(2026),
            lot_size_sqft: None,
            hoa_monthly: 0.0,
            property_type: None,
            listing_url: None,
        }
    }

    #[test]
    fn overridden_coefficients_change_the_heuristic_estimate() {
        let calibration: Calibration = serde_json::from_str(
            r#"{"heuristic": {"base_rent_per_sqft": 1.5, "state_multipliers": {"oh": 1.0}}}"#,
        )
        .expect("calibration parses");

        let standard = HeuristicRentModel::standard(2026);
        let tuned = calibration.heuristic.apply(standard.clone());
        tuned.validate().expect("tuned model is valid");

        assert_eq!(tuned.reference_year, 2026);
        assert_eq!(tuned.bedroom_premium, standard.bedroom_premium);
        assert_eq!(tuned.state_multiplier("CA"), standard.state_multiplier("CA"));
        // 1500 * 1.2 * 0.85 + 3 * 85 + 60
        assert!((standard.estimate(&listing()) - 1845.0).abs() < 1e-9);
        // 1500 * 1.5 * 1.0 + 3 * 85 + 60
        assert!((tuned.estimate(&listing()) - 2565.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_overrides_fail_model_validation() {
        let overrides = HeuristicRentOverrides {
            depreciation_floor: Some(1.5),
            ..HeuristicRentOverrides::default()
        };
        let model = overrides.apply(HeuristicRentModel::standard(2026));
        assert!(model.validate().is_err());
    }

    #[test]
    fn tax_overrides_merge_into_the_state_table() {
        let overrides = PropertyTaxOverrides {
            default_rate: Some(0.013),
            by_state: BTreeMap::from([("tx".to_string(), 0.0175)]),
        };
        let rates = overrides.apply(PropertyTaxRates::standard());

        assert_eq!(rates.default_rate, 0.013);
        assert_eq!(rates.by_state.get("TX"), Some(&0.0175));
        assert_eq!(
            rates.by_state.get("IL"),
            PropertyTaxRates::standard().by_state.get("IL")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = serde_json::from_str::<Calibration>(r#"{"heuristic": {"base_rent": 2.0}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn load_reports_unreadable_and_malformed_files() {
        let missing = Calibration::load(Path::new("./no-such-calibration.json"));
        assert!(matches!(missing, Err(ConfigError::CalibrationRead { .. })));

        let path = std::env::temp_dir().join(format!(
            "house-hunter-{}-calibration.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").expect("write temp calibration");
        let malformed = Calibration::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(malformed, Err(ConfigError::CalibrationParse { .. })));
    }
}
