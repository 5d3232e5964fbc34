use super::assumptions::PreferenceWeights;
use super::domain::PropertyAttributes;

/// Weighted relative distance between two properties; zero means identical.
pub struct SimilarityScorer;

impl SimilarityScorer {
    pub fn score(
        target: &PropertyAttributes,
        candidate: &PropertyAttributes,
        weights: &PreferenceWeights,
    ) -> f64 {
        let terms = [
            (target.sqft, candidate.sqft, weights.sqft()),
            (target.bedrooms, candidate.bedrooms, weights.bedrooms()),
            (target.bathrooms, candidate.bathrooms, weights.bathrooms()),
            (target.year_built, candidate.year_built, weights.year_built()),
            (
                target.lot_size_sqft,
                candidate.lot_size_sqft,
                weights.lot_size(),
            ),
        ];

        terms
            .iter()
            .map(|(target, candidate, weight)| relative_difference(*target, *candidate) * weight)
            .sum()
    }

    /// Maps a distance onto (0, 1]; an exact match weighs 1.
    pub fn comp_weight(distance: f64) -> f64 {
        1.0 / (1.0 + distance.max(0.0))
    }
}

fn relative_difference(target: Option<f64>, candidate: Option<f64>) -> f64 {
    match (target, candidate) {
        (Some(target), Some(candidate)) if target.is_finite() && candidate.is_finite() => {
            (target - candidate).abs() / target.max(1.0)
        }
        _ => 0.0,
    }
}
