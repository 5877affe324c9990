//! Google Places Nearby Search and Geocoding web services

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use super::{EnrichmentProvider, Place};
use crate::config::EnrichmentConfig;
use crate::http::{build_client, read_json};
use crate::models::Coordinate;
use crate::{Result, TowerIntelError};

const SERVICE: &str = "places provider";

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

/// `OK` and `ZERO_RESULTS` are answers; anything else means the call failed
fn check_status(status: &str, error_message: Option<&str>) -> Result<()> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(TowerIntelError::upstream(
            SERVICE,
            format!("status {other}: {}", error_message.unwrap_or("no details")),
        )),
    }
}

pub struct GooglePlacesProvider {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl GooglePlacesProvider {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TowerIntelError::config("Enrichment API key is not configured"))?;

        Ok(Self {
            client: build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn nearby_for_type(
        &self,
        center: Coordinate,
        radius_meters: u32,
        place_type: &str,
    ) -> Result<Vec<NearbyResult>> {
        let url = format!(
            "{}/place/nearbysearch/json?location={},{}&radius={}&type={}&key={}",
            self.base_url,
            center.lat,
            center.lng,
            radius_meters,
            urlencoding::encode(place_type),
            urlencoding::encode(&self.api_key)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TowerIntelError::upstream(SERVICE, e.to_string()))?;
        let body: NearbySearchResponse = read_json(response, SERVICE).await?;
        check_status(&body.status, body.error_message.as_deref())?;
        Ok(body.results)
    }
}

#[async_trait]
impl EnrichmentProvider for GooglePlacesProvider {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn search_nearby(
        &self,
        center: Coordinate,
        radius_meters: u32,
        categories: &[&str],
    ) -> Result<Vec<Place>> {
        let mut seen = HashSet::new();
        let mut places = Vec::new();
        for category in categories {
            for result in self.nearby_for_type(center, radius_meters, category).await? {
                if seen.insert(result.place_id.clone()) {
                    places.push(Place {
                        id: result.place_id,
                        name: result.name,
                        types: result.types,
                    });
                }
            }
        }
        tracing::debug!(count = places.len(), "Nearby places found");
        Ok(places)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn reverse_geocode(&self, center: Coordinate) -> Result<Option<String>> {
        let url = format!(
            "{}/geocode/json?latlng={},{}&key={}",
            self.base_url,
            center.lat,
            center.lng,
            urlencoding::encode(&self.api_key)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TowerIntelError::upstream(SERVICE, e.to_string()))?;
        let body: GeocodeResponse = read_json(response, SERVICE).await?;
        check_status(&body.status, body.error_message.as_deref())?;
        Ok(body.results.into_iter().next().map(|r| r.formatted_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> GooglePlacesProvider {
        GooglePlacesProvider::new(&EnrichmentConfig {
            api_key: Some("test-key".to_string()),
            base_url: server.uri(),
            timeout_seconds: 5,
            max_retries: 0,
            search_radius_meters: 2000,
        })
        .unwrap()
    }

    fn place(id: &str) -> serde_json::Value {
        serde_json::json!({"place_id": id, "name": format!("Place {id}"), "types": ["bank"]})
    }

    #[tokio::test]
    async fn test_search_nearby_merges_categories_without_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/place/nearbysearch/json"))
            .and(query_param("type", "bank"))
            .and(query_param("radius", "2000"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK", "results": [place("a"), place("b")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/place/nearbysearch/json"))
            .and(query_param("type", "shopping_mall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK", "results": [place("b"), place("c")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/place/nearbysearch/json"))
            .and(query_param("type", "school"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ZERO_RESULTS", "results": []
            })))
            .mount(&server)
            .await;

        let places = provider_for(&server)
            .search_nearby(
                Coordinate::new(-26.2041, 28.0473),
                2000,
                &["bank", "shopping_mall", "school"],
            )
            .await
            .unwrap();
        let ids: Vec<&str> = places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_denied_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/place/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .search_nearby(Coordinate::new(0.0, 0.0), 2000, &["bank"])
            .await
            .unwrap_err();
        assert!(matches!(err, TowerIntelError::UpstreamUnavailable { .. }));
        assert!(err.to_string().contains("REQUEST_DENIED"));
    }

    #[tokio::test]
    async fn test_reverse_geocode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocode/json"))
            .and(query_param("latlng", "-26.2041,28.0473"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [{"formatted_address": "Johannesburg Central, Johannesburg, 2001, South Africa"}]
            })))
            .mount(&server)
            .await;

        let address = provider_for(&server)
            .reverse_geocode(Coordinate::new(-26.2041, 28.0473))
            .await
            .unwrap();
        assert_eq!(
            address.as_deref(),
            Some("Johannesburg Central, Johannesburg, 2001, South Africa")
        );
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = GooglePlacesProvider::new(&EnrichmentConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, TowerIntelError::Config { .. }));
    }
}
