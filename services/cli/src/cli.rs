use crate::rapidapi::{EndpointSettings, HttpMethod, RapidApiClient, RapidApiSettings, SaleQuery};
use crate::render::{render_json, render_text, ReportHeader};
use chrono::Datelike;
use clap::{Parser, ValueEnum};
use house_hunter::config::{AppConfig, Calibration, DEFAULT_CONFIG_FILE};
use house_hunter::error::AppError;
use house_hunter::ingest;
use house_hunter::telemetry;
use house_hunter::underwriting::{
    CompIndex, CompSources, FetchError, FinancingAssumptions, FinancingTerms, HeuristicRentModel,
    InsuranceCost, Listing, ListingFilter, LocationFilter, PipelineOptions, PreferenceWeights,
    PropertyTaxRates, RentSource, RentalCompFetcher, RentEstimatorConfig, TargetHome,
    UnderwritingPipeline,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ListingSource {
    Csv,
    RapidapiRealtor,
}

#[derive(Parser, Debug)]
#[command(
    name = "house-hunter",
    about = "Recommend investment houses with positive monthly cashflow",
    version
)]
pub(crate) struct Cli {
    /// Where for-sale listings come from
    #[arg(long, value_enum, default_value_t = ListingSource::Csv)]
    pub(crate) source: ListingSource,
    /// CSV file with active listings (required for --source csv)
    #[arg(long)]
    pub(crate) listings_csv: Option<PathBuf>,
    /// ZIP code, state abbreviation, or "City, ST"
    #[arg(long)]
    pub(crate) location: String,
    /// Maximum purchase price
    #[arg(long)]
    pub(crate) max_price: f64,
    /// Maximum cash available for the down payment
    #[arg(long)]
    pub(crate) max_down_payment: f64,
    /// Planned down payment (defaults to the maximum)
    #[arg(long)]
    pub(crate) down_payment: Option<f64>,
    /// Minimum down payment as a fraction of price required by the lender
    #[arg(long, default_value_t = 0.0)]
    pub(crate) min_down_payment_pct: f64,
    /// Annual mortgage rate in percent
    #[arg(long, default_value_t = 6.75)]
    pub(crate) interest_rate: f64,
    #[arg(long, default_value_t = 30)]
    pub(crate) loan_years: u32,

    #[arg(long, default_value_t = 1800.0)]
    pub(crate) target_sqft: f64,
    #[arg(long, default_value_t = 3.0)]
    pub(crate) target_bedrooms: f64,
    #[arg(long, default_value_t = 2.0)]
    pub(crate) target_bathrooms: f64,
    #[arg(long, default_value_t = 1995.0)]
    pub(crate) target_year_built: f64,
    #[arg(long, default_value_t = 7000.0)]
    pub(crate) target_lot_size: f64,

    #[arg(long, default_value_t = 3.0)]
    pub(crate) weight_sqft: f64,
    #[arg(long, default_value_t = 2.0)]
    pub(crate) weight_bedrooms: f64,
    #[arg(long, default_value_t = 2.0)]
    pub(crate) weight_bathrooms: f64,
    #[arg(long, default_value_t = 1.5)]
    pub(crate) weight_year_built: f64,
    #[arg(long, default_value_t = 1.0)]
    pub(crate) weight_lot_size: f64,

    /// Annual insurance as a fraction of price
    #[arg(long, default_value_t = 0.0035)]
    pub(crate) insurance_rate: f64,
    /// Flat monthly insurance premium; overrides the rate-based estimate
    #[arg(long)]
    pub(crate) insurance_monthly: Option<f64>,
    /// Uplift from homeowner to landlord policy pricing
    #[arg(long, default_value_t = 1.15)]
    pub(crate) landlord_insurance_multiplier: f64,
    /// Annual maintenance as a fraction of price
    #[arg(long, default_value_t = 0.01)]
    pub(crate) maintenance_rate: f64,
    /// Management fee as a fraction of rent
    #[arg(long, default_value_t = 0.10)]
    pub(crate) management_rate: f64,
    /// Vacancy reserve as a fraction of rent
    #[arg(long, default_value_t = 0.05)]
    pub(crate) vacancy_rate: f64,
    /// Annual PMI rate on the loan when less than 20% is put down
    #[arg(long, default_value_t = 0.0)]
    pub(crate) pmi_rate: f64,
    /// Single annual property tax rate for every state
    #[arg(long)]
    pub(crate) property_tax_rate: Option<f64>,

    #[arg(long, default_value_t = RentSource::Hybrid)]
    pub(crate) rent_source: RentSource,
    /// CSV of local rental comps (used by --rent-source csv|hybrid)
    #[arg(long)]
    pub(crate) rental_comps_csv: Option<PathBuf>,
    /// Minimum comps required before comp-based rent is trusted
    #[arg(long, default_value_t = 3)]
    pub(crate) min_rent_comps: usize,
    /// Comma-separated property types to include (e.g. condo,single_family)
    #[arg(long, value_delimiter = ',')]
    pub(crate) property_types: Vec<String>,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) min_bedrooms: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) min_bathrooms: f64,
    /// Keep every listing instead of one per address
    #[arg(long)]
    pub(crate) keep_duplicates: bool,
    /// Maximum recommendations returned
    #[arg(long, default_value_t = 10)]
    pub(crate) results: usize,

    /// RapidAPI key (overrides RAPIDAPI_KEY and the config file)
    #[arg(long)]
    pub(crate) rapidapi_key: Option<String>,
    /// Optional KEY=VALUE config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub(crate) config_file: PathBuf,
    /// JSON file recalibrating heuristic rent coefficients and property tax rates
    /// (overrides HOUSE_HUNTER_CALIBRATION_FILE)
    #[arg(long)]
    pub(crate) calibration_file: Option<PathBuf>,
    #[arg(long, default_value = "realtor-search.p.rapidapi.com")]
    pub(crate) rapidapi_host: String,
    #[arg(long, default_value = "/properties/v3/list")]
    pub(crate) rapidapi_endpoint: String,
    #[arg(long, default_value_t = 42)]
    pub(crate) rapidapi_limit: u32,
    #[arg(long, value_enum, ignore_case = true, default_value_t = HttpMethod::Get)]
    pub(crate) rapidapi_method: HttpMethod,
    #[arg(long, default_value = "zip")]
    pub(crate) rapidapi_location_param: String,
    #[arg(long, default_value = "/properties/v3/list-for-rent")]
    pub(crate) rapidapi_rent_endpoint: String,
    #[arg(long, default_value_t = 40)]
    pub(crate) rapidapi_rent_limit: u32,
    #[arg(long, value_enum, ignore_case = true, default_value_t = HttpMethod::Get)]
    pub(crate) rapidapi_rent_method: HttpMethod,
    #[arg(long, default_value = "zip")]
    pub(crate) rapidapi_rent_location_param: String,

    /// Print recommendations as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

impl Cli {
    /// Rejects argument combinations that cannot produce a run.
    pub(crate) fn validate(&self) -> Result<(), AppError> {
        if self.source == ListingSource::Csv && self.listings_csv.is_none() {
            return Err(AppError::Usage(
                "--listings-csv is required when --source csv".to_string(),
            ));
        }
        if self.rent_source == RentSource::Csv && self.rental_comps_csv.is_none() {
            return Err(AppError::Usage(
                "--rental-comps-csv is required when --rent-source csv".to_string(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::Usage("--location must not be empty".to_string()));
        }
        Ok(())
    }

    /// `--property-tax-rate` flattens the table and wins over any calibration.
    pub(crate) fn financing_terms(&self, calibration: &Calibration) -> FinancingTerms {
        let insurance = match self.insurance_monthly {
            Some(monthly) => InsuranceCost::FlatMonthly(monthly),
            None => match InsuranceCost::standard() {
                InsuranceCost::RateOfPrice { state_factors, .. } => InsuranceCost::RateOfPrice {
                    annual_rate: self.insurance_rate,
                    landlord_multiplier: self.landlord_insurance_multiplier,
                    state_factors,
                },
                flat => flat,
            },
        };
        let property_tax = self
            .property_tax_rate
            .map(PropertyTaxRates::flat)
            .unwrap_or_else(|| calibration.property_tax.apply(PropertyTaxRates::standard()));

        FinancingTerms {
            mortgage_rate: self.interest_rate / 100.0,
            term_months: self.loan_years.saturating_mul(12),
            insurance,
            maintenance_rate: self.maintenance_rate,
            management_rate: self.management_rate,
            vacancy_rate: self.vacancy_rate,
            pmi_rate: self.pmi_rate,
            max_price: self.max_price,
            max_down_payment: self.max_down_payment,
            down_payment: self.down_payment,
            min_down_payment_pct: self.min_down_payment_pct,
            property_tax,
        }
    }

    pub(crate) fn preference_weights(&self) -> Result<PreferenceWeights, AppError> {
        Ok(PreferenceWeights::new(
            self.weight_sqft,
            self.weight_bedrooms,
            self.weight_bathrooms,
            self.weight_year_built,
            self.weight_lot_size,
        )?)
    }

    pub(crate) fn target_home(&self) -> TargetHome {
        TargetHome {
            sqft: Some(self.target_sqft),
            bedrooms: Some(self.target_bedrooms),
            bathrooms: Some(self.target_bathrooms),
            year_built: Some(self.target_year_built),
            lot_size_sqft: Some(self.target_lot_size),
        }
    }

    pub(crate) fn listing_filter(&self) -> ListingFilter {
        ListingFilter {
            location: Some(LocationFilter::parse(&self.location)),
            min_bedrooms: self.min_bedrooms,
            min_bathrooms: self.min_bathrooms,
            ..ListingFilter::default()
        }
        .with_property_types(&self.property_types)
    }

    pub(crate) fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            rent_source: self.rent_source,
            filter: self.listing_filter(),
            target: Some(self.target_home()),
            max_results: Some(self.results),
            deduplicate: !self.keep_duplicates,
        }
    }

    pub(crate) fn rapidapi_settings(&self) -> RapidApiSettings {
        RapidApiSettings {
            host: self.rapidapi_host.clone(),
            sale: EndpointSettings {
                path: self.rapidapi_endpoint.clone(),
                limit: self.rapidapi_limit,
                method: self.rapidapi_method,
                location_param: self.rapidapi_location_param.clone(),
            },
            rent: EndpointSettings {
                path: self.rapidapi_rent_endpoint.clone(),
                limit: self.rapidapi_rent_limit,
                method: self.rapidapi_rent_method,
                location_param: self.rapidapi_rent_location_param.clone(),
            },
        }
    }

    /// Sale-search constraints; allows one fewer room than the target home.
    pub(crate) fn sale_query(&self) -> SaleQuery {
        SaleQuery {
            location: LocationFilter::parse(&self.location),
            max_price: self.max_price,
            min_bedrooms: self.min_bedrooms.max(self.target_bedrooms.trunc() - 1.0),
            min_bathrooms: self.min_bathrooms.max(self.target_bathrooms.trunc() - 1.0),
            min_sqft: (self.target_sqft * 0.6).trunc().max(500.0),
            property_types: self
                .property_types
                .iter()
                .map(|kind| kind.trim().to_string())
                .filter(|kind| !kind.is_empty())
                .collect(),
        }
    }
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    cli.validate()?;

    let config = AppConfig::load(&cli.config_file)?;
    telemetry::init(&config.telemetry)?;

    let calibration = config.calibration(cli.calibration_file.as_deref())?;
    let assumptions = FinancingAssumptions::new(cli.financing_terms(&calibration))?;
    let heuristic = calibration
        .heuristic
        .apply(HeuristicRentModel::standard(chrono::Local::now().year()));
    heuristic.validate()?;
    let estimator = RentEstimatorConfig {
        weights: cli.preference_weights()?,
        min_comps: cli.min_rent_comps,
        ..RentEstimatorConfig::new(heuristic)
    };

    let needs_api =
        cli.source == ListingSource::RapidapiRealtor || cli.rent_source.uses_api_comps();
    let client = if needs_api {
        api_client(&cli, &config)?
    } else {
        None
    };

    let listings = load_listings(&cli, client.as_ref())?;
    let comp_index = match (&cli.rental_comps_csv, cli.rent_source.uses_csv_comps()) {
        (Some(path), true) => Some(CompIndex::new(ingest::csv::load_rental_comps(path)?)),
        _ => None,
    };

    let sources = CompSources {
        csv: comp_index.as_ref(),
        api: client
            .as_ref()
            .map(|client| client as &dyn RentalCompFetcher),
    };
    let pipeline = UnderwritingPipeline::new(estimator, assumptions, cli.pipeline_options());
    let results = pipeline.run(&listings, &sources);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        render_json(&mut out, &results)?;
    } else {
        let header = ReportHeader {
            location: &cli.location,
            max_price: cli.max_price,
        };
        render_text(&mut out, &results, &header)?;
    }
    out.flush()?;
    Ok(())
}

/// A missing key only fails the run when listings themselves come from the API.
fn api_client(cli: &Cli, config: &AppConfig) -> Result<Option<RapidApiClient>, AppError> {
    let api_key = match config.rapidapi_key(cli.rapidapi_key.as_deref()) {
        Ok(key) => key,
        Err(err) if cli.source == ListingSource::Csv => {
            warn!(
                error = %err,
                "rental comp API disabled; falling back to heuristic rent where needed"
            );
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let client = RapidApiClient::new(cli.rapidapi_settings(), api_key).map_err(FetchError::from)?;
    Ok(Some(client))
}

fn load_listings(cli: &Cli, client: Option<&RapidApiClient>) -> Result<Vec<Listing>, AppError> {
    let listings = match cli.source {
        ListingSource::Csv => match &cli.listings_csv {
            Some(path) => ingest::csv::load_listings(path)?,
            None => {
                return Err(AppError::Usage(
                    "--listings-csv is required when --source csv".to_string(),
                ))
            }
        },
        ListingSource::RapidapiRealtor => match client {
            Some(client) => client
                .search_listings(&cli.sale_query())
                .map_err(FetchError::from)?,
            None => return Err(AppError::Usage("RapidAPI client unavailable".to_string())),
        },
    };

    info!(count = listings.len(), source = ?cli.source, "loaded listings");
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use house_hunter::config::PropertyTaxOverrides;
    use std::collections::BTreeMap;

    fn parse(extra: &[&str]) -> Cli {
        let mut args = vec![
            "house-hunter",
            "--location",
            "43604",
            "--max-price",
            "250000",
            "--max-down-payment",
            "40000",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).expect("arguments parse")
    }

    #[test]
    fn defaults_match_documented_assumptions() {
        let cli = parse(&["--listings-csv", "listings.csv"]);
        cli.validate().expect("valid combination");

        let terms = cli.financing_terms(&Calibration::default());
        assert!((terms.mortgage_rate - 0.0675).abs() < 1e-12);
        assert_eq!(terms.term_months, 360);
        assert_eq!(terms.pmi_rate, 0.0);
        assert_eq!(cli.rent_source, RentSource::Hybrid);
        assert_eq!(cli.results, 10);
        assert_eq!(cli.config_file, PathBuf::from(".house_hunter.env"));
        assert!(FinancingAssumptions::new(terms).is_ok());
    }

    #[test]
    fn csv_source_requires_listings_file() {
        match parse(&[]).validate() {
            Err(AppError::Usage(message)) => assert!(message.contains("--listings-csv")),
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn csv_rent_source_requires_comps_file() {
        let cli = parse(&["--listings-csv", "l.csv", "--rent-source", "csv"]);
        match cli.validate() {
            Err(AppError::Usage(message)) => assert!(message.contains("--rental-comps-csv")),
            other => panic!("expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_rent_source_is_rejected_by_the_parser() {
        let result = Cli::try_parse_from([
            "house-hunter",
            "--location",
            "TX",
            "--max-price",
            "1",
            "--max-down-payment",
            "1",
            "--rent-source",
            "zillow",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn insurance_flags_shape_the_cost_model() {
        let flat = parse(&["--listings-csv", "l.csv", "--insurance-monthly", "95"]);
        assert_eq!(
            flat.financing_terms(&Calibration::default()).insurance,
            InsuranceCost::FlatMonthly(95.0)
        );

        let rated = parse(&[
            "--listings-csv",
            "l.csv",
            "--insurance-rate",
            "0.005",
            "--landlord-insurance-multiplier",
            "1.0",
        ]);
        match rated.financing_terms(&Calibration::default()).insurance {
            InsuranceCost::RateOfPrice {
                annual_rate,
                landlord_multiplier,
                state_factors,
            } => {
                assert_eq!(annual_rate, 0.005);
                assert_eq!(landlord_multiplier, 1.0);
                assert!(state_factors.contains_key("FL"));
            }
            other => panic!("expected rate-based insurance, got {other:?}"),
        }
    }

    #[test]
    fn calibrated_tax_table_applies_unless_a_flat_rate_is_given() {
        let calibration = Calibration {
            property_tax: PropertyTaxOverrides {
                by_state: BTreeMap::from([("OH".to_string(), 0.02)]),
                ..PropertyTaxOverrides::default()
            },
            ..Calibration::default()
        };

        let tabled = parse(&["--listings-csv", "l.csv", "--calibration-file", "tune.json"]);
        assert_eq!(tabled.calibration_file, Some(PathBuf::from("tune.json")));
        let rates = tabled.financing_terms(&calibration).property_tax;
        assert_eq!(rates.by_state.get("OH"), Some(&0.02));
        assert!(rates.by_state.contains_key("TX"));

        let flat = parse(&["--listings-csv", "l.csv", "--property-tax-rate", "0.01"]);
        assert_eq!(
            flat.financing_terms(&calibration).property_tax,
            PropertyTaxRates::flat(0.01)
        );
    }

    #[test]
    fn filters_and_methods_parse_from_flags() {
        let cli = parse(&[
            "--listings-csv",
            "l.csv",
            "--property-types",
            "Condo,single_family",
            "--min-bedrooms",
            "2",
            "--rapidapi-method",
            "post",
        ]);

        let filter = cli.listing_filter();
        assert!(filter.property_types.contains("condo"));
        assert!(filter.property_types.contains("single_family"));
        assert_eq!(filter.min_bedrooms, 2.0);
        assert_eq!(filter.location, Some(LocationFilter::Zip("43604".to_string())));
        assert_eq!(cli.rapidapi_method, HttpMethod::Post);

        let query = cli.sale_query();
        assert_eq!(query.min_bedrooms, 2.0);
        assert_eq!(query.min_sqft, 1080.0);
    }
}
