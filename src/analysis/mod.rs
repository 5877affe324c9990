//! Location analysis pipeline
//!
//! Fetch candidate towers, filter them by distance, gather place counts,
//! compute factors, score, flag risks, estimate revenue and attach
//! recommendations. Results are memoised per request in a [`ResultCache`].

pub mod assistant;
pub mod compare;
pub mod factors;
pub mod recommendations;
pub mod risk;
pub mod scoring;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::ResultCache;
use crate::completion::CompletionProvider;
use crate::config::{JitterMode, TowerIntelConfig};
use crate::enrichment::{
    BUSINESS_CATEGORIES, EnrichmentProvider, FIBER_CATEGORIES, POPULATION_CATEGORIES,
};
use crate::geo::GeographicSearch;
use crate::models::{AnalysisRequest, AnalyzedLocation, BoundingBox, LocationAnalysis, Tower};
use crate::towers::{TowerSearch, TowerStore};
use crate::{Result, TowerIntelError};

use assistant::Assistant;
use factors::{Jitter, PlaceCounts};
use recommendations::RecommendationEngine;

pub use assistant::VoiceAnalysis;
pub use compare::{ComparisonFailure, ComparisonReport, LocationInput, RankedLocation};

/// Tuning knobs for the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub default_radius_meters: f64,
    pub enrichment_radius_meters: u32,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub jitter: JitterMode,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from_config(&TowerIntelConfig::default())
    }
}

impl AnalysisSettings {
    #[must_use]
    pub fn from_config(config: &TowerIntelConfig) -> Self {
        Self {
            default_radius_meters: config.analysis.default_radius_meters,
            enrichment_radius_meters: config.enrichment.search_radius_meters,
            max_concurrency: config.analysis.max_concurrency.max(1),
            request_timeout: config.analysis.request_timeout(),
            cache_ttl: config.cache.ttl(),
            jitter: config.analysis.jitter,
        }
    }
}

/// The analysis engine. Owns its caches; create one per process.
pub struct AnalysisService {
    towers: Arc<dyn TowerStore>,
    enrichment: Arc<dyn EnrichmentProvider>,
    recommendations: RecommendationEngine,
    assistant: Assistant,
    analyses: ResultCache<LocationAnalysis>,
    searches: ResultCache<Vec<Tower>>,
    settings: AnalysisSettings,
}

impl AnalysisService {
    pub fn new(
        towers: Arc<dyn TowerStore>,
        enrichment: Arc<dyn EnrichmentProvider>,
        completion: Arc<dyn CompletionProvider>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            towers,
            enrichment,
            recommendations: RecommendationEngine::new(
                Arc::clone(&completion),
                settings.request_timeout,
            ),
            assistant: Assistant::new(completion, settings.request_timeout),
            analyses: ResultCache::new(settings.cache_ttl),
            searches: ResultCache::new(settings.cache_ttl),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    #[must_use]
    pub fn tower_store(&self) -> &dyn TowerStore {
        self.towers.as_ref()
    }

    #[must_use]
    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Drop every cached analysis and search result
    pub fn invalidate_all(&self) {
        self.analyses.invalidate_all();
        self.searches.invalidate_all();
    }

    /// Drop expired entries from both caches
    pub fn purge_expired(&self) -> usize {
        self.analyses.purge_expired() + self.searches.purge_expired()
    }

    /// Number of cached analyses
    #[must_use]
    pub fn cached_analyses(&self) -> usize {
        self.analyses.len()
    }

    /// Analyse a location, reusing a cached result within the TTL
    #[tracing::instrument(skip(self), fields(key = %request.cache_key()))]
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<LocationAnalysis> {
        self.analyses
            .get_or_try_insert_with(&request.cache_key(), || self.run_pipeline(request))
            .await
    }

    /// Tower search, memoised by its canonical arguments
    pub async fn search_towers(&self, search: &TowerSearch) -> Result<Vec<Tower>> {
        let key = format!(
            "search_cell_towers:{}",
            serde_json::to_string(search).map_err(|e| TowerIntelError::general(e.to_string()))?
        );
        self.searches
            .get_or_try_insert_with(&key, || async {
                search
                    .run(self.towers.as_ref(), self.settings.default_radius_meters)
                    .await
            })
            .await
    }

    async fn with_deadline<T>(
        deadline: Instant,
        operation: &str,
        future: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout_at(deadline, future)
            .await
            .map_err(|_| TowerIntelError::timeout(operation))?
    }

    async fn nearby_towers(
        &self,
        request: &AnalysisRequest,
        deadline: Instant,
    ) -> Result<Vec<Tower>> {
        let bounds = BoundingBox::around(request.coordinate, request.radius_meters);
        let candidates = Self::with_deadline(
            deadline,
            "fetching towers",
            self.towers.towers_in_bounds(bounds),
        )
        .await?;
        GeographicSearch::towers_within_radius(
            &candidates,
            request.coordinate,
            request.radius_meters,
        )
    }

    async fn place_counts(&self, request: &AnalysisRequest) -> Result<PlaceCounts> {
        let center = request.coordinate;
        let radius = self.settings.enrichment_radius_meters;
        let provider = self.enrichment.as_ref();

        let (fiber, population, business, address) = futures::try_join!(
            provider.search_nearby(center, radius, FIBER_CATEGORIES.categories),
            provider.search_nearby(center, radius, POPULATION_CATEGORIES.categories),
            provider.search_nearby(center, radius, BUSINESS_CATEGORIES.categories),
            provider.reverse_geocode(center),
        )?;

        Ok(PlaceCounts {
            fiber: fiber.len(),
            population: population.len(),
            business: business.len(),
            address,
        })
    }

    async fn run_pipeline(&self, request: AnalysisRequest) -> Result<LocationAnalysis> {
        tracing::info!(
            "Analyzing location {} with radius {}m",
            request.coordinate.format_coordinates(),
            request.radius_meters
        );

        // One budget for the whole request; later stages get what is left
        let deadline = Instant::now() + self.settings.request_timeout;

        let nearby = self.nearby_towers(&request, deadline).await?;
        let places =
            Self::with_deadline(deadline, "enriching location", self.place_counts(&request))
                .await?;

        let jitter = Jitter::for_location(self.settings.jitter, request.coordinate);
        let factors = factors::compute_factors(&nearby, request.radius_meters, &places, jitter);
        let score = scoring::score(&factors);
        let risks = risk::identify_risks(&factors, score, nearby.len());
        let estimated_revenue = risk::estimate_revenue(score, &factors);
        let recommendations = self
            .recommendations
            .generate_until(&factors, deadline)
            .await;

        if recommendations.is_empty() {
            return Err(TowerIntelError::general(
                "analysis produced no recommendations",
            ));
        }

        tracing::debug!(score, nearby = nearby.len(), "Location analysed");

        Ok(LocationAnalysis {
            score,
            factors,
            recommendations,
            risks,
            estimated_revenue,
            nearby_towers: nearby.len(),
            location: AnalyzedLocation {
                lat: request.coordinate.lat,
                lng: request.coordinate.lng,
                address: places.address,
            },
        })
    }
}
