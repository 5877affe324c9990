//! Places and geocoding enrichment
//!
//! Nearby-place counts stand in for infrastructure, population and business
//! data. Providers sit behind [`EnrichmentProvider`] so tests can swap in a
//! deterministic double.

pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::Coordinate;

pub use google::GooglePlacesProvider;

/// A point of interest returned by a nearby search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Place categories queried for one factor, with the count that saturates it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategorySet {
    pub categories: &'static [&'static str],
    pub saturation: f64,
}

impl CategorySet {
    /// Count normalised by the saturation cap, clamped to `[0, 1]`
    #[must_use]
    pub fn normalise(&self, count: usize) -> f64 {
        (count as f64 / self.saturation).min(1.0)
    }
}

pub const FIBER_CATEGORIES: CategorySet = CategorySet {
    categories: &["establishment"],
    saturation: 20.0,
};

pub const POPULATION_CATEGORIES: CategorySet = CategorySet {
    categories: &["restaurant", "school", "hospital", "shopping_mall"],
    saturation: 15.0,
};

pub const BUSINESS_CATEGORIES: CategorySet = CategorySet {
    categories: &["bank", "shopping_mall", "corporate_office", "convenience_store"],
    saturation: 10.0,
};

/// External places / geocoding capability
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Places of any of `categories` within `radius_meters` of `center`
    async fn search_nearby(
        &self,
        center: Coordinate,
        radius_meters: u32,
        categories: &[&str],
    ) -> Result<Vec<Place>>;

    /// Human-readable address of `center`, if the provider knows one
    async fn reverse_geocode(&self, center: Coordinate) -> Result<Option<String>>;
}

/// Provider used when no places API key is configured. Tower tools keep
/// working; location analysis reports the enrichment service as unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEnrichment;

#[async_trait]
impl EnrichmentProvider for UnavailableEnrichment {
    async fn search_nearby(
        &self,
        _center: Coordinate,
        _radius_meters: u32,
        _categories: &[&str],
    ) -> Result<Vec<Place>> {
        Err(crate::TowerIntelError::upstream(
            "places provider",
            "no places API key configured",
        ))
    }

    async fn reverse_geocode(&self, _center: Coordinate) -> Result<Option<String>> {
        Err(crate::TowerIntelError::upstream(
            "places provider",
            "no places API key configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_saturates() {
        assert_eq!(FIBER_CATEGORIES.normalise(10), 0.5);
        assert_eq!(FIBER_CATEGORIES.normalise(40), 1.0);
        assert_eq!(BUSINESS_CATEGORIES.normalise(0), 0.0);
        assert!((POPULATION_CATEGORIES.normalise(5) - 1.0 / 3.0).abs() < 1e-12);
    }
}
