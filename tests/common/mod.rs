//! Shared doubles and fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use towerintel::analysis::AnalysisSettings;
use towerintel::rpc::RpcHandler;
use towerintel::{
    AnalysisService, CompletionProvider, CompletionRequest, Coordinate, EnrichmentProvider,
    InMemoryTowerStore, JitterMode, Place, RadioType, ToolRegistry, Tower, TowerIntelError,
};

pub const JOHANNESBURG: (f64, f64) = (-26.2041, 28.0473);

pub fn tower(id: i64, radio: RadioType, lat: f64, lon: f64, range: f64, signal: f64) -> Tower {
    Tower {
        id,
        radio,
        mcc: Some(655),
        net: Some(1),
        area: Some(100),
        cell: Some(id as u64 * 10),
        lat,
        lon,
        range,
        samples: 50,
        average_signal: signal,
    }
}

/// Three towers within 1 km of central Johannesburg, one in Sandton (~10 km
/// north) and one in Pretoria
pub fn johannesburg_towers() -> Vec<Tower> {
    vec![
        tower(1, RadioType::Lte, -26.2050, 28.0480, 1500.0, -65.0),
        tower(2, RadioType::Gsm, -26.2000, 28.0400, 2000.0, -78.0),
        tower(3, RadioType::Umts, -26.2100, 28.0500, 1000.0, -92.0),
        tower(4, RadioType::Lte, -26.1076, 28.0567, 1200.0, -55.0),
        tower(5, RadioType::Nr, -25.7479, 28.2293, 800.0, -70.0),
    ]
}

/// Enrichment double that counts calls and returns `places_per_call` places
pub struct CountingEnrichment {
    pub places_per_call: usize,
    pub address: Option<String>,
    pub latency: Duration,
    nearby_calls: AtomicUsize,
    geocode_calls: AtomicUsize,
    geocodes_in_flight: AtomicUsize,
    peak_geocodes: AtomicUsize,
}

impl CountingEnrichment {
    pub fn new(places_per_call: usize, address: Option<&str>) -> Self {
        Self {
            places_per_call,
            address: address.map(str::to_string),
            latency: Duration::ZERO,
            nearby_calls: AtomicUsize::new(0),
            geocode_calls: AtomicUsize::new(0),
            geocodes_in_flight: AtomicUsize::new(0),
            peak_geocodes: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn nearby_calls(&self) -> usize {
        self.nearby_calls.load(Ordering::SeqCst)
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    /// Most reverse geocodes seen running at once; each pipeline issues exactly one
    pub fn peak_geocodes(&self) -> usize {
        self.peak_geocodes.load(Ordering::SeqCst)
    }

    /// Adapter calls of any kind
    pub fn total_calls(&self) -> usize {
        self.nearby_calls() + self.geocode_calls()
    }
}

#[async_trait]
impl EnrichmentProvider for CountingEnrichment {
    async fn search_nearby(
        &self,
        _center: Coordinate,
        _radius_meters: u32,
        categories: &[&str],
    ) -> towerintel::Result<Vec<Place>> {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok((0..self.places_per_call)
            .map(|i| Place {
                id: format!("{}-{i}", categories.join("|")),
                name: format!("Place {i}"),
                types: categories.iter().map(|c| (*c).to_string()).collect(),
            })
            .collect())
    }

    async fn reverse_geocode(&self, _center: Coordinate) -> towerintel::Result<Option<String>> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.geocodes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_geocodes.fetch_max(running, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.geocodes_in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.address.clone())
    }
}

/// Completion double that always answers with the same text
pub struct ScriptedCompletion {
    pub reply: String,
    pub latency: Duration,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, _request: CompletionRequest) -> towerintel::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.reply.clone())
    }
}

/// Completion double that always fails
pub struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, _request: CompletionRequest) -> towerintel::Result<String> {
        Err(TowerIntelError::upstream("completion provider", "connection refused"))
    }
}

pub fn settings() -> AnalysisSettings {
    AnalysisSettings {
        default_radius_meters: 5000.0,
        enrichment_radius_meters: 2000,
        max_concurrency: 4,
        request_timeout: Duration::from_secs(30),
        cache_ttl: Duration::from_secs(300),
        jitter: JitterMode::None,
    }
}

pub fn service_with(
    enrichment: Arc<CountingEnrichment>,
    completion: Arc<dyn CompletionProvider>,
) -> Arc<AnalysisService> {
    service_with_towers(johannesburg_towers(), enrichment, completion)
}

pub fn service_with_towers(
    towers: Vec<Tower>,
    enrichment: Arc<CountingEnrichment>,
    completion: Arc<dyn CompletionProvider>,
) -> Arc<AnalysisService> {
    Arc::new(AnalysisService::new(
        Arc::new(InMemoryTowerStore::new(towers)),
        enrichment,
        completion,
        settings(),
    ))
}

pub fn registry_with(
    enrichment: Arc<CountingEnrichment>,
    completion: Arc<dyn CompletionProvider>,
) -> ToolRegistry {
    ToolRegistry::new(service_with(enrichment, completion)).expect("tool schemas compile")
}

pub fn handler_with(
    enrichment: Arc<CountingEnrichment>,
    completion: Arc<dyn CompletionProvider>,
) -> RpcHandler {
    RpcHandler::new(Arc::new(registry_with(enrichment, completion)))
}
