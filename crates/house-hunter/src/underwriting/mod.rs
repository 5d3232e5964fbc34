//! Rent estimation and cashflow underwriting for for-sale listings.
//!
//! Nothing in this module touches the filesystem, network, or environment; callers
//! hand in fully loaded listings and comps plus validated assumptions.

pub mod assumptions;
pub mod cashflow;
pub mod domain;
pub mod pipeline;
pub mod rent;
pub mod screening;
pub mod similarity;

pub use assumptions::{
    AssumptionError, FinancingAssumptions, FinancingTerms, HeuristicRentModel, InsuranceCost,
    PreferenceWeights, PropertyTaxRates,
};
pub use cashflow::{mortgage_payment, CashflowCalculator};
pub use domain::{
    CashflowBreakdown, CompOrigin, EstimateSource, Listing, PropertyAttributes, RentEstimate,
    RentSource, RentalComp, TargetHome, Underwriting, UnknownRentSource,
};
pub use pipeline::{PipelineOptions, UnderwritingPipeline};
pub use rent::{
    weighted_median, CompIndex, CompSources, FetchError, RentEstimator, RentEstimatorConfig,
    RentalCompFetcher, WeightedRent,
};
pub use screening::{screen_budget, ListingFilter, LocationFilter, Rejection};
pub use similarity::SimilarityScorer;
