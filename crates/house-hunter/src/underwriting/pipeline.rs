use super::assumptions::FinancingAssumptions;
use super::cashflow::CashflowCalculator;
use super::domain::{Listing, RentSource, TargetHome, Underwriting};
use super::rent::{CompSources, RentEstimator, RentEstimatorConfig};
use super::screening::{normalize_address_key, screen_budget, ListingFilter, Rejection};
use super::similarity::SimilarityScorer;
use std::collections::HashMap;
use tracing::{debug, info};

/// Run-wide knobs that do not affect the numbers computed for a single listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub rent_source: RentSource,
    pub filter: ListingFilter,
    /// Buyer's ideal home; when set each result carries a fit score.
    pub target: Option<TargetHome>,
    pub max_results: Option<usize>,
    /// Keep only the best-cashflow listing per normalized address and ZIP.
    pub deduplicate: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rent_source: RentSource::default(),
            filter: ListingFilter::default(),
            target: None,
            max_results: None,
            deduplicate: true,
        }
    }
}

/// Screens, prices, and ranks listings as rental investments.
pub struct UnderwritingPipeline {
    estimator: RentEstimator,
    assumptions: FinancingAssumptions,
    options: PipelineOptions,
}

impl UnderwritingPipeline {
    pub fn new(
        estimator: RentEstimatorConfig,
        assumptions: FinancingAssumptions,
        options: PipelineOptions,
    ) -> Self {
        Self {
            estimator: RentEstimator::new(estimator),
            assumptions,
            options,
        }
    }

    /// Positive-cashflow listings, best first; ties keep `listing_id` order.
    pub fn run(&self, listings: &[Listing], sources: &CompSources<'_>) -> Vec<Underwriting> {
        let mut screened_out = 0usize;
        let mut negative = 0usize;
        let mut positive = Vec::new();

        for listing in listings {
            match self.underwrite(listing, sources) {
                Ok(result) if result.cashflow.net_cashflow > 0.0 => positive.push(result),
                Ok(result) => {
                    negative += 1;
                    debug!(
                        listing_id = %listing.listing_id,
                        net_cashflow = result.cashflow.net_cashflow,
                        "listing does not cashflow"
                    );
                }
                Err(rejection) => {
                    screened_out += 1;
                    debug!(listing_id = %listing.listing_id, ?rejection, "listing screened out");
                }
            }
        }

        let mut results = if self.options.deduplicate {
            deduplicate(positive)
        } else {
            positive
        };
        rank(&mut results);
        if let Some(limit) = self.options.max_results {
            results.truncate(limit);
        }

        info!(
            considered = listings.len(),
            screened_out,
            negative,
            recommended = results.len(),
            rent_source = %self.options.rent_source,
            "underwriting complete"
        );
        results
    }

    /// Underwrites one listing without applying the positive-cashflow filter.
    pub fn underwrite(
        &self,
        listing: &Listing,
        sources: &CompSources<'_>,
    ) -> Result<Underwriting, Rejection> {
        if !self.options.filter.accepts(listing) {
            return Err(Rejection::FilteredOut);
        }
        screen_budget(listing, &self.assumptions)?;

        let rent = self
            .estimator
            .estimate(listing, sources, self.options.rent_source);
        let cashflow = CashflowCalculator::compute(listing, &rent, &self.assumptions);

        let down_payment = self.assumptions.down_payment_for(listing.price);
        let loan_amount = (listing.price - down_payment).max(0.0);
        let cash_on_cash_return =
            (down_payment > 0.0).then(|| cashflow.net_cashflow * 12.0 / down_payment * 100.0);

        let preference_fit = self.options.target.as_ref().map(|target| {
            let distance = SimilarityScorer::score(
                target,
                &listing.attributes(),
                &self.estimator.config().weights,
            );
            SimilarityScorer::comp_weight(distance)
        });

        Ok(Underwriting {
            listing: listing.clone(),
            rent,
            cashflow,
            down_payment,
            loan_amount,
            cash_on_cash_return,
            preference_fit,
        })
    }
}

fn rank(results: &mut [Underwriting]) {
    results.sort_by(|left, right| {
        right
            .cashflow
            .net_cashflow
            .total_cmp(&left.cashflow.net_cashflow)
            .then_with(|| left.listing.listing_id.cmp(&right.listing.listing_id))
    });
}

fn deduplicate(results: Vec<Underwriting>) -> Vec<Underwriting> {
    let mut best: HashMap<String, Underwriting> = HashMap::with_capacity(results.len());

    for result in results {
        let address = normalize_address_key(&result.listing.address);
        let key = if address.is_empty() {
            format!("id:{}", result.listing.listing_id)
        } else {
            format!("{address}|{}", result.listing.zip_code.trim())
        };

        match best.get(&key) {
            Some(existing) if !is_better(&result, existing) => {}
            _ => {
                best.insert(key, result);
            }
        }
    }

    best.into_values().collect()
}

fn is_better(candidate: &Underwriting, existing: &Underwriting) -> bool {
    let (candidate_net, existing_net) = (
        candidate.cashflow.net_cashflow,
        existing.cashflow.net_cashflow,
    );
    if candidate_net != existing_net {
        return candidate_net > existing_net;
    }
    if candidate.listing.price != existing.listing.price {
        return candidate.listing.price < existing.listing.price;
    }
    candidate.listing.listing_id < existing.listing.listing_id
}
