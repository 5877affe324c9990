//! Tower store backed by a vector, optionally loaded from a JSON file

use std::path::Path;

use async_trait::async_trait;

use super::TowerStore;
use crate::models::{BoundingBox, Tower};
use crate::{Result, TowerIntelError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryTowerStore {
    towers: Vec<Tower>,
}

impl InMemoryTowerStore {
    #[must_use]
    pub fn new(towers: Vec<Tower>) -> Self {
        Self { towers }
    }

    /// Load a JSON array of towers in the store's wire format
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let towers: Vec<Tower> = serde_json::from_str(&content).map_err(|e| {
            TowerIntelError::config(format!(
                "Failed to parse tower fixture {}: {e}",
                path.display()
            ))
        })?;
        tracing::info!(count = towers.len(), path = %path.display(), "Loaded tower fixture");
        Ok(Self::new(towers))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.towers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }
}

#[async_trait]
impl TowerStore for InMemoryTowerStore {
    async fn all_towers(&self) -> Result<Vec<Tower>> {
        Ok(self.towers.clone())
    }

    async fn towers_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<Tower>> {
        Ok(self
            .towers
            .iter()
            .filter(|t| bounds.contains(t.coordinate()))
            .cloned()
            .collect())
    }

    async fn tower_by_id(&self, id: i64) -> Result<Option<Tower>> {
        Ok(self.towers.iter().find(|t| t.id == id).cloned())
    }
}
