//! Cell tower records as served by the external tower store

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Radio access technology of a tower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RadioType {
    Gsm,
    Umts,
    Lte,
    Cdma,
    Nr,
    #[serde(other)]
    Unknown,
}

impl RadioType {
    /// Parse a radio type case-insensitively; unrecognised names yield `None`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "GSM" => Some(Self::Gsm),
            "UMTS" => Some(Self::Umts),
            "LTE" => Some(Self::Lte),
            "CDMA" => Some(Self::Cdma),
            "NR" | "5G" => Some(Self::Nr),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gsm => "GSM",
            Self::Umts => "UMTS",
            Self::Lte => "LTE",
            Self::Cdma => "CDMA",
            Self::Nr => "NR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RadioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell tower. Owned by the tower store and never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tower {
    pub id: i64,
    pub radio: RadioType,
    #[serde(default)]
    pub mcc: Option<u32>,
    #[serde(default)]
    pub net: Option<u32>,
    #[serde(default)]
    pub area: Option<u32>,
    #[serde(default)]
    pub cell: Option<u64>,
    pub lat: f64,
    pub lon: f64,
    /// Declared range in meters
    #[serde(default)]
    pub range: f64,
    #[serde(default)]
    pub samples: u32,
    /// Average signal in dBm
    pub average_signal: f64,
}

impl Tower {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Axis-aligned lat/lng box used to prefetch candidate towers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box containing every point within `radius_meters` great-circle distance of
    /// `center`, padded slightly. Spans every longitude when the circle reaches a
    /// pole or crosses the antimeridian; the exact distance filter runs afterwards.
    #[must_use]
    pub fn around(center: Coordinate, radius_meters: f64) -> Self {
        // Same sphere as the haversine distance in `geo`
        const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
        const MARGIN: f64 = 1.01;

        let angular = (radius_meters * MARGIN / EARTH_RADIUS_METERS).min(std::f64::consts::PI);
        let lat_delta = angular.to_degrees();
        let min_lat = (center.lat - lat_delta).max(-90.0);
        let max_lat = (center.lat + lat_delta).min(90.0);

        let full = Self {
            min_lat,
            max_lat,
            min_lon: -180.0,
            max_lon: 180.0,
        };
        if min_lat <= -90.0 || max_lat >= 90.0 {
            return full;
        }

        let ratio = angular.sin() / center.lat.to_radians().cos();
        if ratio >= 1.0 {
            return full;
        }
        let lon_delta = ratio.asin().to_degrees();
        let (min_lon, max_lon) = (center.lng - lon_delta, center.lng + lon_delta);
        if min_lon < -180.0 || max_lon > 180.0 {
            return full;
        }

        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coordinate.lat)
            && (self.min_lon..=self.max_lon).contains(&coordinate.lng)
    }
}
