use crate::underwriting::domain::RentalComp;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Rental comps grouped by five-digit ZIP, holding only comps with a usable rent.
#[derive(Debug, Clone, Default)]
pub struct CompIndex {
    by_zip: HashMap<String, Vec<RentalComp>>,
    excluded: usize,
}

impl CompIndex {
    pub fn new<I>(comps: I) -> Self
    where
        I: IntoIterator<Item = RentalComp>,
    {
        let mut index = Self::default();
        for comp in comps {
            index.insert(comp);
        }

        if index.excluded > 0 {
            warn!(
                excluded = index.excluded,
                "skipped rental comps with missing rent or malformed zip"
            );
        }
        index
    }

    fn insert(&mut self, comp: RentalComp) {
        let Some(zip) = comp.normalized_zip().map(str::to_string) else {
            debug!(comp_id = %comp.comp_id, zip = %comp.zip_code, "comp has malformed zip");
            self.excluded += 1;
            return;
        };
        if comp.usable_rent().is_none() {
            debug!(comp_id = %comp.comp_id, "comp has no positive rent");
            self.excluded += 1;
            return;
        }

        self.by_zip.entry(zip).or_default().push(comp);
    }

    pub fn in_zip(&self, zip: &str) -> &[RentalComp] {
        self.by_zip.get(zip).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_zip.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_zip.is_empty()
    }

    /// Number of comps rejected while building the index.
    pub fn excluded(&self) -> usize {
        self.excluded
    }
}

/// Supplies rental comps for a ZIP on demand (e.g. a live listings API).
pub trait RentalCompFetcher: Send + Sync {
    fn fetch_rental_comps(&self, zip_code: &str) -> Result<Vec<RentalComp>, FetchError>;
}

/// Failure reported by a [`RentalCompFetcher`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("rental comp source unavailable: {0}")]
    Unavailable(String),
    #[error("rental comp response could not be read: {0}")]
    InvalidResponse(String),
}

/// Comp evidence available to the estimator during one run.
#[derive(Clone, Copy, Default)]
pub struct CompSources<'a> {
    pub csv: Option<&'a CompIndex>,
    pub api: Option<&'a dyn RentalCompFetcher>,
}

impl<'a> CompSources<'a> {
    pub fn csv(index: &'a CompIndex) -> Self {
        Self {
            csv: Some(index),
            api: None,
        }
    }

    pub fn with_api(mut self, fetcher: &'a dyn RentalCompFetcher) -> Self {
        self.api = Some(fetcher);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(comp_id: &str, zip: &str, rent: Option<f64>) -> RentalComp {
        RentalComp {
            comp_id: comp_id.to_string(),
            address: format!("{comp_id} Elm St"),
            city: "Dayton".to_string(),
            state: "OH".to_string(),
            zip_code: zip.to_string(),
            monthly_rent: rent,
            sqft: Some(1400.0),
            bedrooms: Some(3.0),
            bathrooms: Some(1.5),
            year_built: Some(1978),
            lot_size_sqft: None,
        }
    }

    #[test]
    fn index_groups_by_normalized_zip_and_drops_bad_comps() {
        let index = CompIndex::new(vec![
            comp("a", "45402", Some(1350.0)),
            comp("b", "45402-1187", Some(1425.0)),
            comp("c", "45402", Some(0.0)),
            comp("d", "45402", None),
            comp("e", "N/A", Some(1500.0)),
            comp("f", "45419", Some(1600.0)),
        ]);

        assert_eq!(index.in_zip("45402").len(), 2);
        assert_eq!(index.in_zip("45419").len(), 1);
        assert!(index.in_zip("90210").is_empty());
        assert_eq!(index.len(), 3);
        assert_eq!(index.excluded(), 3);
    }

    #[test]
    fn empty_index_is_valid() {
        let index = CompIndex::new(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }
}
