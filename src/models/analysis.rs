//! Factor sets and the finished location analysis

use serde::{Deserialize, Serialize, Serializer};

use super::Coordinate;

/// The five normalised inputs to the composite score, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorSet {
    pub cell_coverage: f64,
    pub fiber_proximity: f64,
    pub population_density: f64,
    pub business_potential: f64,
    pub signal_strength: f64,
}

impl FactorSet {
    /// Build a factor set, clamping every value into `[0, 1]`
    #[must_use]
    pub fn clamped(
        cell_coverage: f64,
        fiber_proximity: f64,
        population_density: f64,
        business_potential: f64,
        signal_strength: f64,
    ) -> Self {
        Self {
            cell_coverage: clamp_unit(cell_coverage),
            fiber_proximity: clamp_unit(fiber_proximity),
            population_density: clamp_unit(population_density),
            business_potential: clamp_unit(business_potential),
            signal_strength: clamp_unit(signal_strength),
        }
    }

    /// Same value for every factor
    #[must_use]
    pub fn uniform(value: f64) -> Self {
        Self::clamped(value, value, value, value, value)
    }

    /// Factors in weight order
    #[must_use]
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.cell_coverage,
            self.fiber_proximity,
            self.population_density,
            self.business_potential,
            self.signal_strength,
        ]
    }

    /// Whole-number percentages, as shown to people and prompts
    #[must_use]
    pub fn percentages(&self) -> [u32; 5] {
        self.as_array().map(|v| (v * 100.0).round() as u32)
    }
}

/// Clamp into `[0, 1]`; NaN collapses to 0
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Where the analysis was run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl AnalyzedLocation {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Finished analysis for one location. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAnalysis {
    /// Unrounded composite score; serialised to two decimals
    #[serde(serialize_with = "serialize_two_decimals")]
    pub score: f64,
    pub factors: FactorSet,
    pub recommendations: Vec<String>,
    pub risks: Vec<String>,
    pub estimated_revenue: u64,
    pub nearby_towers: usize,
    pub location: AnalyzedLocation,
}

impl LocationAnalysis {
    /// Score rounded for display
    #[must_use]
    pub fn display_score(&self) -> f64 {
        round_two_decimals(self.score)
    }
}

#[must_use]
pub fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn serialize_two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_two_decimals(*value))
}
