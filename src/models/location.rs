//! Coordinate value object and the analysis request built around it

use serde::{Deserialize, Serialize};

use crate::{Result, TowerIntelError};

/// Geographic point in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

impl Coordinate {
    /// Create a new coordinate without range checks
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range values
    pub fn checked(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(TowerIntelError::validation(format!(
                "Coordinates must be finite numbers, got: {lat}, {lng}"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(TowerIntelError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(TowerIntelError::validation(format!(
                "Longitude must be between -180 and 180, got: {lng}"
            )));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.lat * multiplier).round() / multiplier;
        let lng = (self.lng * multiplier).round() / multiplier;
        (lat, lng)
    }

    /// Parse coordinates from a string like "-26.2041,28.0473" or "-26.2041 28.0473"
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(TowerIntelError::validation(
                "Coordinates must be in format 'lat,lng'",
            ));
        }

        let lat = parts[0]
            .parse::<f64>()
            .map_err(|_| TowerIntelError::validation(format!("Invalid latitude: {}", parts[0])))?;
        let lng = parts[1]
            .parse::<f64>()
            .map_err(|_| TowerIntelError::validation(format!("Invalid longitude: {}", parts[1])))?;

        Self::checked(lat, lng)
    }
}

/// One analysis call: where to look and how far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisRequest {
    pub coordinate: Coordinate,
    pub radius_meters: f64,
}

impl AnalysisRequest {
    /// Build a request, rejecting bad coordinates and non-positive radii
    pub fn new(lat: f64, lng: f64, radius_meters: f64) -> Result<Self> {
        let coordinate = Coordinate::checked(lat, lng)?;
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(TowerIntelError::validation(format!(
                "Radius must be greater than 0 meters, got: {radius_meters}"
            )));
        }
        Ok(Self {
            coordinate,
            radius_meters,
        })
    }

    /// Canonical cache key: coordinates to 6 decimals, the radius exactly.
    /// Adding `0.0` folds `-0.0` into `0.0`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lng) = self.coordinate.rounded_coordinates(6);
        format!(
            "analysis:{:.6}:{:.6}:{}",
            lat + 0.0,
            lng + 0.0,
            self.radius_meters + 0.0
        )
    }
}
