//! Read-only access to the external cell tower inventory
//!
//! The tower store is owned elsewhere; this module only queries it and
//! derives search results and coverage statistics from what it returns.

pub mod http;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::GeographicSearch;
use crate::models::{BoundingBox, Coordinate, RadioType, Tower};
use crate::{Result, TowerIntelError};

pub use http::HttpTowerStore;
pub use memory::InMemoryTowerStore;

/// Read-only tower inventory
#[async_trait]
pub trait TowerStore: Send + Sync {
    async fn all_towers(&self) -> Result<Vec<Tower>>;

    async fn towers_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<Tower>>;

    /// `None` when no tower has this id
    async fn tower_by_id(&self, id: i64) -> Result<Option<Tower>>;
}

/// Filters accepted by the tower search tool. Every bound is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerSearch {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub radio_type: Option<String>,
    #[serde(default)]
    pub min_signal: Option<f64>,
    #[serde(default)]
    pub max_signal: Option<f64>,
}

impl TowerSearch {
    /// Run the search against `store`.
    ///
    /// A `lat,lng` query limits the result to towers within `radius_meters`
    /// of that point; any other query text matches radio type, id or MCC.
    pub async fn run(&self, store: &dyn TowerStore, radius_meters: f64) -> Result<Vec<Tower>> {
        if let (Some(min), Some(max)) = (self.min_signal, self.max_signal) {
            if min > max {
                return Err(TowerIntelError::validation(format!(
                    "minSignal ({min}) must not exceed maxSignal ({max})"
                )));
            }
        }

        let query = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());

        let (candidates, text) = match query.map(|q| (q, Coordinate::parse(q))) {
            Some((_, Ok(center))) => {
                let boxed = store
                    .towers_in_bounds(BoundingBox::around(center, radius_meters))
                    .await?;
                (
                    GeographicSearch::towers_within_radius(&boxed, center, radius_meters)?,
                    None,
                )
            }
            Some((q, Err(_))) => (store.all_towers().await?, Some(q.to_lowercase())),
            None => (store.all_towers().await?, None),
        };

        let radio = self.radio_type.as_deref().map(str::trim);
        Ok(candidates
            .into_iter()
            .filter(|tower| text.as_deref().is_none_or(|t| matches_text(tower, t)))
            .filter(|tower| radio.is_none_or(|r| tower.radio.as_str().eq_ignore_ascii_case(r)))
            .filter(|tower| self.min_signal.is_none_or(|min| tower.average_signal >= min))
            .filter(|tower| self.max_signal.is_none_or(|max| tower.average_signal <= max))
            .collect())
    }
}

fn matches_text(tower: &Tower, text: &str) -> bool {
    tower.radio.as_str().to_lowercase().contains(text)
        || tower.id.to_string().contains(text)
        || tower.mcc.is_some_and(|mcc| mcc.to_string().contains(text))
}

/// Parameters of the coverage statistics tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageQuery {
    #[serde(default)]
    pub radio_type: Option<String>,
    #[serde(default)]
    pub min_lat: Option<f64>,
    #[serde(default)]
    pub max_lat: Option<f64>,
    #[serde(default)]
    pub min_lon: Option<f64>,
    #[serde(default)]
    pub max_lon: Option<f64>,
}

impl CoverageQuery {
    /// The bounding box, only when all four bounds are given
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        Some(BoundingBox {
            min_lat: self.min_lat?,
            max_lat: self.max_lat?,
            min_lon: self.min_lon?,
            max_lon: self.max_lon?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub average: f64,
    pub strongest: f64,
    pub weakest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleStats {
    pub total_samples: u64,
    pub avg_samples_per_tower: f64,
}

/// Aggregate statistics over a set of towers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub total_towers: usize,
    pub radio_distribution: BTreeMap<String, usize>,
    pub signal_stats: SignalStats,
    pub sample_stats: SampleStats,
}

impl CoverageReport {
    /// Statistics for `towers`; an empty set is an error
    pub fn from_towers(towers: &[Tower]) -> Result<Self> {
        if towers.is_empty() {
            return Err(TowerIntelError::not_found(
                "no towers found for the given criteria",
            ));
        }

        let mut radio_distribution = BTreeMap::new();
        for tower in towers {
            *radio_distribution
                .entry(tower.radio.as_str().to_string())
                .or_insert(0) += 1;
        }

        let count = towers.len() as f64;
        let signals = towers.iter().map(|t| t.average_signal);
        let total_samples: u64 = towers.iter().map(|t| u64::from(t.samples)).sum();

        Ok(Self {
            total_towers: towers.len(),
            radio_distribution,
            signal_stats: SignalStats {
                average: signals.clone().sum::<f64>() / count,
                strongest: signals.clone().fold(f64::NEG_INFINITY, f64::max),
                weakest: signals.fold(f64::INFINITY, f64::min),
            },
            sample_stats: SampleStats {
                total_samples,
                avg_samples_per_tower: total_samples as f64 / count,
            },
        })
    }
}

/// Coverage statistics for the towers matching `query`
pub async fn analyze_coverage(
    store: &dyn TowerStore,
    query: &CoverageQuery,
) -> Result<CoverageReport> {
    let towers = match query.bounds() {
        Some(bounds) => store.towers_in_bounds(bounds).await?,
        None => store.all_towers().await?,
    };

    let radio = query.radio_type.as_deref().and_then(RadioType::parse);
    if query.radio_type.is_some() && radio.is_none() {
        return Err(TowerIntelError::validation(format!(
            "Unknown radio type: {}",
            query.radio_type.as_deref().unwrap_or_default()
        )));
    }

    let selected: Vec<Tower> = towers
        .into_iter()
        .filter(|t| radio.is_none_or(|r| t.radio == r))
        .collect();
    CoverageReport::from_towers(&selected)
}
