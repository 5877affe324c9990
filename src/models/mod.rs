//! Data models for the `TowerIntel` engine
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates and analysis requests
//! - Tower: read-only cell tower records and bounding boxes
//! - Analysis: factor sets and finished location analyses

pub mod analysis;
pub mod location;
pub mod tower;

// Re-export all public types for convenient access
pub use analysis::{AnalyzedLocation, FactorSet, LocationAnalysis};
pub use location::{AnalysisRequest, Coordinate};
pub use tower::{BoundingBox, RadioType, Tower};
