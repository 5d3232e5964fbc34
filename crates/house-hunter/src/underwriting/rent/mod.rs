mod heuristic;
mod median;
mod sources;

pub use median::{weighted_median, WeightedRent};
pub use sources::{CompIndex, CompSources, FetchError, RentalCompFetcher};

use super::assumptions::{HeuristicRentModel, PreferenceWeights};
use super::domain::{CompOrigin, EstimateSource, Listing, RentEstimate, RentSource, RentalComp};
use super::similarity::SimilarityScorer;
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Settings shared by every estimate in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RentEstimatorConfig {
    pub weights: PreferenceWeights,
    pub heuristic: HeuristicRentModel,
    /// Comps a source must contribute before its median is trusted.
    pub min_comps: usize,
    /// Floor applied to comp-derived rent.
    pub minimum_comp_rent: f64,
}

impl RentEstimatorConfig {
    pub fn new(heuristic: HeuristicRentModel) -> Self {
        Self {
            weights: PreferenceWeights::default(),
            heuristic,
            min_comps: 3,
            minimum_comp_rent: 500.0,
        }
    }
}

/// Estimates achievable rent from comp evidence, degrading to the heuristic formula.
pub struct RentEstimator {
    config: RentEstimatorConfig,
    api_failure_reported: AtomicBool,
}

impl RentEstimator {
    pub fn new(config: RentEstimatorConfig) -> Self {
        Self {
            config,
            api_failure_reported: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &RentEstimatorConfig {
        &self.config
    }

    pub fn estimate(
        &self,
        listing: &Listing,
        sources: &CompSources<'_>,
        rent_source: RentSource,
    ) -> RentEstimate {
        let origins = rent_source.origins();
        if origins.is_empty() {
            return self.heuristic(listing, EstimateSource::Heuristic);
        }

        let Some(zip) = listing.normalized_zip() else {
            debug!(
                listing_id = %listing.listing_id,
                zip = %listing.zip_code,
                "listing zip is malformed; using heuristic rent"
            );
            return self.heuristic(listing, EstimateSource::HeuristicFallback);
        };

        for origin in origins {
            let comps = self.comps_for(*origin, sources, zip);
            if let Some((monthly_rent, comp_count)) = self.rent_from_comps(listing, &comps) {
                debug!(
                    listing_id = %listing.listing_id,
                    source = ?origin,
                    comp_count,
                    monthly_rent,
                    "estimated rent from comps"
                );
                return RentEstimate {
                    monthly_rent,
                    source_used: EstimateSource::from(*origin),
                    comp_count,
                };
            }
        }

        self.heuristic(listing, EstimateSource::HeuristicFallback)
    }

    fn heuristic(&self, listing: &Listing, source_used: EstimateSource) -> RentEstimate {
        RentEstimate {
            monthly_rent: self.config.heuristic.estimate(listing),
            source_used,
            comp_count: 0,
        }
    }

    fn comps_for<'s>(
        &self,
        origin: CompOrigin,
        sources: &CompSources<'s>,
        zip: &str,
    ) -> Cow<'s, [RentalComp]> {
        match origin {
            CompOrigin::Csv => match sources.csv {
                Some(index) => Cow::Borrowed(index.in_zip(zip)),
                None => Cow::Owned(Vec::new()),
            },
            CompOrigin::RapidApi => match sources.api {
                Some(fetcher) => Cow::Owned(self.fetch_api_comps(fetcher, zip)),
                None => Cow::Owned(Vec::new()),
            },
        }
    }

    fn fetch_api_comps(&self, fetcher: &dyn RentalCompFetcher, zip: &str) -> Vec<RentalComp> {
        match fetcher.fetch_rental_comps(zip) {
            Ok(comps) => comps
                .into_iter()
                .filter(|comp| comp.normalized_zip() == Some(zip) && comp.usable_rent().is_some())
                .collect(),
            Err(err) => {
                if !self.api_failure_reported.swap(true, Ordering::Relaxed) {
                    warn!(
                        error = %err,
                        "rental comp API unavailable; falling back to heuristic rent"
                    );
                }
                Vec::new()
            }
        }
    }

    fn rent_from_comps(&self, listing: &Listing, comps: &[RentalComp]) -> Option<(f64, usize)> {
        let target = listing.attributes();
        let weighted: Vec<WeightedRent<'_>> = comps
            .iter()
            .filter_map(|comp| {
                let rent = comp.usable_rent()?;
                let distance =
                    SimilarityScorer::score(&target, &comp.attributes(), &self.config.weights);
                Some(WeightedRent {
                    comp_id: &comp.comp_id,
                    rent,
                    weight: SimilarityScorer::comp_weight(distance),
                })
            })
            .collect();

        if weighted.len() < self.config.min_comps.max(1) {
            return None;
        }

        weighted_median(&weighted)
            .map(|rent| (rent.max(self.config.minimum_comp_rent), weighted.len()))
    }
}
