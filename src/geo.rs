//! Great-circle distance and radius search over towers

use crate::models::{Coordinate, Tower};
use crate::{Result, TowerIntelError};

/// Great-circle distance between two points in meters
pub fn distance(a: Coordinate, b: Coordinate) -> Result<f64> {
    if !a.is_finite() || !b.is_finite() {
        return Err(TowerIntelError::validation(format!(
            "Cannot measure distance between non-finite coordinates ({}, {}) and ({}, {})",
            a.lat, a.lng, b.lat, b.lng
        )));
    }

    let km = haversine::distance(
        haversine::Location {
            latitude: a.lat,
            longitude: a.lng,
        },
        haversine::Location {
            latitude: b.lat,
            longitude: b.lng,
        },
        haversine::Units::Kilometers,
    );
    Ok(km * 1000.0)
}

/// Geographic search functionality
pub struct GeographicSearch;

impl GeographicSearch {
    /// Towers whose distance to `center` is at most `radius_meters`
    pub fn towers_within_radius(
        towers: &[Tower],
        center: Coordinate,
        radius_meters: f64,
    ) -> Result<Vec<Tower>> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(TowerIntelError::validation(format!(
                "Radius must be greater than 0 meters, got: {radius_meters}"
            )));
        }

        let mut nearby = Vec::new();
        for tower in towers {
            if distance(center, tower.coordinate())? <= radius_meters {
                nearby.push(tower.clone());
            }
        }
        Ok(nearby)
    }
}
