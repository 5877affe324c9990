//! Client for the cell tower REST API

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;

use super::TowerStore;
use crate::config::TowerStoreConfig;
use crate::http::{build_client, read_json};
use crate::models::{BoundingBox, Tower};
use crate::Result;

const SERVICE: &str = "tower store";

pub struct HttpTowerStore {
    client: ClientWithMiddleware,
    base_url: String,
}

impl HttpTowerStore {
    pub fn new(config: &TowerStoreConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        tracing::debug!(url, "Tower store request");
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| crate::TowerIntelError::upstream(SERVICE, e.to_string()))
    }
}

#[async_trait]
impl TowerStore for HttpTowerStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn all_towers(&self) -> Result<Vec<Tower>> {
        let response = self.get(&self.base_url).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        read_json(response, SERVICE).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn towers_in_bounds(&self, bounds: BoundingBox) -> Result<Vec<Tower>> {
        let url = format!(
            "{}/location?minLat={}&maxLat={}&minLon={}&maxLon={}",
            self.base_url, bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
        );
        let response = self.get(&url).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        read_json(response, SERVICE).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn tower_by_id(&self, id: i64) -> Result<Option<Tower>> {
        let response = self.get(&format!("{}/{id}", self.base_url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response, SERVICE).await.map(Some)
    }
}
