//! `TowerIntel` - Geospatial location intelligence for cell tower investment
//!
//! This library fuses nearby tower, place and geocoding data into an
//! explainable investment score, a risk list, a revenue estimate and
//! natural-language recommendations, and exposes the pipeline through a
//! named-tool RPC surface.

pub mod analysis;
pub mod cache;
pub mod completion;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod geo;
pub mod http;
pub mod logging;
pub mod models;
pub mod rpc;
pub mod server;
pub mod tools;
pub mod towers;

// Re-export core types for public API
pub use analysis::{AnalysisService, ComparisonReport, LocationInput};
pub use cache::ResultCache;
pub use completion::{CompletionProvider, CompletionRequest, OpenAiCompletion};
pub use config::{JitterMode, TowerIntelConfig};
pub use enrichment::{EnrichmentProvider, GooglePlacesProvider, Place};
pub use error::TowerIntelError;
pub use geo::{GeographicSearch, distance};
pub use models::{
    AnalysisRequest, AnalyzedLocation, BoundingBox, Coordinate, FactorSet, LocationAnalysis,
    RadioType, Tower,
};
pub use tools::{ToolDefinition, ToolError, ToolName, ToolRegistry};
pub use towers::{HttpTowerStore, InMemoryTowerStore, TowerStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TowerIntelError>;
