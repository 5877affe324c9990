//! Shared outbound HTTP plumbing for the upstream adapters

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

use crate::{Result, TowerIntelError};

const USER_AGENT: &str = concat!("TowerIntel/", env!("CARGO_PKG_VERSION"));

/// Build a client with a request timeout and transient-error retries
pub fn build_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| TowerIntelError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Fail with `UpstreamUnavailable` on a non-success status, otherwise decode the body
pub async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    service: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(service, %status, "Upstream returned an error status");
        return Err(TowerIntelError::upstream(
            service,
            format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| TowerIntelError::upstream(service, format!("Failed to read body: {e}")))?;
    serde_json::from_str(&body).map_err(|e| TowerIntelError::malformed(service, e.to_string()))
}
