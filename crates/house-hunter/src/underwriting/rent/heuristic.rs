use crate::underwriting::assumptions::HeuristicRentModel;
use crate::underwriting::domain::Listing;

impl HeuristicRentModel {
    /// Formula rent for a listing when no comp evidence is available.
    pub fn estimate(&self, listing: &Listing) -> f64 {
        let sqft = listing
            .sqft
            .filter(|sqft| sqft.is_finite() && *sqft > 0.0)
            .unwrap_or(self.default_sqft);
        let per_sqft = self.base_rent_per_sqft * self.state_multiplier(&listing.state);

        let bedrooms = listing.bedrooms.filter(|value| value.is_finite()).unwrap_or(0.0);
        let bathrooms = listing.bathrooms.filter(|value| value.is_finite()).unwrap_or(0.0);
        let base = sqft * per_sqft
            + bedrooms.max(0.0) * self.bedroom_premium
            + bathrooms.max(0.0) * self.bathroom_premium;

        (base * self.age_multiplier(listing.year_built)).max(self.minimum_rent)
    }

    fn age_multiplier(&self, year_built: Option<i32>) -> f64 {
        let Some(year_built) = year_built else {
            return 1.0;
        };
        let age = (self.reference_year - year_built).max(0) as f64;
        (1.0 - age * self.depreciation_per_year).max(self.depreciation_floor)
    }
}
