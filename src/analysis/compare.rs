//! Concurrent multi-location comparison

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use super::AnalysisService;
use crate::models::{AnalysisRequest, LocationAnalysis};
use crate::{Result, TowerIntelError};

/// One location to compare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
}

impl LocationInput {
    /// Given name, or the coordinates to four decimals
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(
                || format!("Location {:.4}, {:.4}", self.latitude, self.longitude),
                str::to_string,
            )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedLocation {
    /// 1-based position in the ranking
    pub rank: usize,
    /// Position in the caller's input list
    pub input_index: usize,
    pub name: String,
    pub analysis: LocationAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonFailure {
    pub input_index: usize,
    pub name: String,
    pub error: String,
}

/// Ranked analyses plus the locations that could not be analysed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub ranked: Vec<RankedLocation>,
    pub failures: Vec<ComparisonFailure>,
}

/// Order analysed slots by unrounded score, highest first. The sort is stable,
/// so equal scores keep input order.
fn rank(mut analysed: Vec<(usize, String, LocationAnalysis)>) -> Vec<RankedLocation> {
    analysed.sort_by_key(|(index, _, _)| *index);
    analysed.sort_by(|(_, _, a), (_, _, b)| b.score.total_cmp(&a.score));
    analysed
        .into_iter()
        .enumerate()
        .map(|(position, (input_index, name, analysis))| RankedLocation {
            rank: position + 1,
            input_index,
            name,
            analysis,
        })
        .collect()
}

impl AnalysisService {
    /// Analyse every location with at most `max_concurrency` in flight and rank the results.
    ///
    /// A failing location only fails its own slot; it is reported in `failures`.
    #[tracing::instrument(skip(self, locations), fields(count = locations.len()))]
    pub async fn compare(
        self: &Arc<Self>,
        locations: Vec<LocationInput>,
        radius_meters: Option<f64>,
    ) -> Result<ComparisonReport> {
        if locations.is_empty() {
            return Err(TowerIntelError::validation(
                "at least one location is required",
            ));
        }
        let radius = radius_meters.unwrap_or(self.settings.default_radius_meters);
        let limit = self.settings.max_concurrency.max(1);

        let outcomes: Vec<(usize, String, Result<LocationAnalysis>)> =
            stream::iter(locations.into_iter().enumerate())
                .map(|(index, location)| {
                    let service = Arc::clone(self);
                    let name = location.display_name();
                    let handle = tokio::spawn(async move {
                        let request =
                            AnalysisRequest::new(location.latitude, location.longitude, radius)?;
                        service.analyze(request).await
                    });
                    async move {
                        let outcome = handle.await.unwrap_or_else(|e| {
                            Err(TowerIntelError::general(format!("analysis task failed: {e}")))
                        });
                        (index, name, outcome)
                    }
                })
                .buffer_unordered(limit)
                .collect()
                .await;

        let mut analysed = Vec::new();
        let mut failures = Vec::new();
        for (index, name, outcome) in outcomes {
            match outcome {
                Ok(analysis) => analysed.push((index, name, analysis)),
                Err(e) => {
                    tracing::warn!(
                        index,
                        name = %name,
                        error = %e,
                        "Location failed during comparison"
                    );
                    failures.push(ComparisonFailure {
                        input_index: index,
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }
        failures.sort_by_key(|f| f.input_index);

        Ok(ComparisonReport {
            ranked: rank(analysed),
            failures,
        })
    }
}
