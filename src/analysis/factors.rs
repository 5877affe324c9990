//! The five factor calculators
//!
//! Tower-derived factors are synchronous math over the nearby set.
//! Place-derived factors normalise counts from the enrichment provider.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::config::JitterMode;
use crate::enrichment::{BUSINESS_CATEGORIES, FIBER_CATEGORIES, POPULATION_CATEGORIES};
use crate::models::analysis::clamp_unit;
use crate::models::{Coordinate, FactorSet, Tower};

/// Returned for an empty nearby set instead of zero
pub const EMPTY_SIGNAL_BASELINE: f64 = 0.1;

const SIGNAL_FLOOR_DBM: f64 = -120.0;
const SIGNAL_CEILING_DBM: f64 = -60.0;

const FIBER_JITTER: f64 = 0.3;
const POPULATION_JITTER: f64 = 0.2;

const URBAN_MARKERS: [&str; 3] = ["city", "town", "central"];
const URBAN_MULTIPLIER: f64 = 1.2;
const RURAL_MULTIPLIER: f64 = 0.8;

/// Share of the query circle covered by declared tower ranges, doubled and capped
#[must_use]
pub fn cell_coverage(towers: &[Tower], radius_meters: f64) -> f64 {
    if towers.is_empty() {
        return 0.0;
    }
    let total_range: f64 = towers.iter().map(|t| t.range).sum();
    let area_covered = (total_range / (PI * radius_meters * radius_meters)).min(1.0);
    clamp_unit(area_covered * 2.0)
}

/// Average dBm mapped linearly from `[-120, -60]` onto `[0, 1]`
#[must_use]
pub fn signal_strength(towers: &[Tower]) -> f64 {
    if towers.is_empty() {
        return EMPTY_SIGNAL_BASELINE;
    }
    let average = towers.iter().map(|t| t.average_signal).sum::<f64>() / towers.len() as f64;
    clamp_unit((average - SIGNAL_FLOOR_DBM) / (SIGNAL_CEILING_DBM - SIGNAL_FLOOR_DBM))
}

/// Whether a geocoded address reads as an urban area
#[must_use]
pub fn is_urban(address: Option<&str>) -> bool {
    address.is_some_and(|a| {
        let lower = a.to_lowercase();
        URBAN_MARKERS.iter().any(|marker| lower.contains(marker))
    })
}

/// Place counts gathered from the enrichment provider for one location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceCounts {
    pub fiber: usize,
    pub population: usize,
    pub business: usize,
    pub address: Option<String>,
}

/// Additive bonuses applied to the fiber and population factors
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Jitter {
    pub fiber: f64,
    pub population: f64,
}

impl Jitter {
    /// Bonuses for `mode` at `coordinate`; identical inputs give identical bonuses
    #[must_use]
    pub fn for_location(mode: JitterMode, coordinate: Coordinate) -> Self {
        match mode {
            JitterMode::None => Self::default(),
            JitterMode::Seeded => {
                let mut rng = StdRng::seed_from_u64(location_seed(coordinate));
                Self {
                    fiber: rng.random_range(0.0..FIBER_JITTER),
                    population: rng.random_range(0.0..POPULATION_JITTER),
                }
            }
        }
    }
}

fn location_seed(coordinate: Coordinate) -> u64 {
    let (lat, lng) = coordinate.rounded_coordinates(4);
    let lat_bits = ((lat * 10_000.0).round() as i64) as u64;
    let lng_bits = ((lng * 10_000.0).round() as i64) as u64;
    lat_bits.rotate_left(32) ^ lng_bits
}

/// Assemble the full factor set. Every value ends up in `[0, 1]`.
#[must_use]
pub fn compute_factors(
    nearby: &[Tower],
    radius_meters: f64,
    places: &PlaceCounts,
    jitter: Jitter,
) -> FactorSet {
    let fiber = FIBER_CATEGORIES.normalise(places.fiber) + jitter.fiber;
    let population = POPULATION_CATEGORIES.normalise(places.population) + jitter.population;
    let multiplier = if is_urban(places.address.as_deref()) {
        URBAN_MULTIPLIER
    } else {
        RURAL_MULTIPLIER
    };
    let business = BUSINESS_CATEGORIES.normalise(places.business) * multiplier;

    FactorSet::clamped(
        cell_coverage(nearby, radius_meters),
        fiber,
        population,
        business,
        signal_strength(nearby),
    )
}
