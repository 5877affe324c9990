//! Configuration management for the `TowerIntel` engine
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TowerIntelError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerIntelConfig {
    /// Tower store connection
    #[serde(default)]
    pub tower_store: TowerStoreConfig,
    /// Places / geocoding provider
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    /// Text-completion provider
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Result cache
    #[serde(default)]
    pub cache: CacheConfig,
    /// Analysis pipeline tuning
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

/// Tower store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerStoreConfig {
    /// Base URL of the cell tower REST API
    #[serde(default = "default_tower_store_url")]
    pub base_url: String,
    /// Serve towers from this JSON file instead of the REST API
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Places / geocoding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_enrichment_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Radius used for nearby-place searches
    #[serde(default = "default_enrichment_radius")]
    pub search_radius_meters: u32,
}

/// Text-completion provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_completion_url")]
    pub base_url: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_completion_max_tokens")]
    pub max_tokens: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

/// How the place-derived factors are perturbed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JitterMode {
    /// Factors are pure functions of the place counts
    #[default]
    None,
    /// Bounded pseudo-random bonus seeded by the rounded coordinate
    Seeded,
}

/// Analysis pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_radius")]
    pub default_radius_meters: f64,
    /// Maximum locations analysed at once by the comparator
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub jitter: JitterMode,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_tower_store_url() -> String {
    "http://localhost:8080/api/cell-towers".to_string()
}

fn default_enrichment_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_completion_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_completion_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_completion_max_tokens() -> u32 {
    500
}

fn default_http_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_enrichment_radius() -> u32 {
    2000
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_radius() -> f64 {
    5000.0
}

fn default_max_concurrency() -> usize {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for TowerStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_tower_store_url(),
            fixture_path: None,
            timeout_seconds: default_http_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_enrichment_url(),
            timeout_seconds: default_http_timeout(),
            max_retries: default_max_retries(),
            search_radius_meters: default_enrichment_radius(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_url(),
            model: default_completion_model(),
            timeout_seconds: default_http_timeout(),
            max_tokens: default_completion_max_tokens(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: default_radius(),
            max_concurrency: default_max_concurrency(),
            request_timeout_seconds: default_request_timeout(),
            jitter: JitterMode::None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TowerIntelConfig {
    fn default() -> Self {
        Self {
            tower_store: TowerStoreConfig::default(),
            enrichment: EnrichmentConfig::default(),
            completion: CompletionConfig::default(),
            cache: CacheConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl TowerIntelConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(Self::get_config_path);

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with TOWERINTEL_ prefix
        builder = builder.add_source(
            Environment::with_prefix("TOWERINTEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TowerIntelConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> PathBuf {
        PathBuf::from("towerintel.toml")
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.tower_store.base_url.is_empty() {
            self.tower_store.base_url = default_tower_store_url();
        }
        if self.tower_store.timeout_seconds == 0 {
            self.tower_store.timeout_seconds = default_http_timeout();
        }
        if self.enrichment.base_url.is_empty() {
            self.enrichment.base_url = default_enrichment_url();
        }
        if self.enrichment.timeout_seconds == 0 {
            self.enrichment.timeout_seconds = default_http_timeout();
        }
        if self.enrichment.search_radius_meters == 0 {
            self.enrichment.search_radius_meters = default_enrichment_radius();
        }
        if self.completion.base_url.is_empty() {
            self.completion.base_url = default_completion_url();
        }
        if self.completion.model.is_empty() {
            self.completion.model = default_completion_model();
        }
        if self.completion.timeout_seconds == 0 {
            self.completion.timeout_seconds = default_http_timeout();
        }
        if self.completion.max_tokens == 0 {
            self.completion.max_tokens = default_completion_max_tokens();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.analysis.default_radius_meters <= 0.0 {
            self.analysis.default_radius_meters = default_radius();
        }
        if self.analysis.max_concurrency == 0 {
            self.analysis.max_concurrency = default_max_concurrency();
        }
        if self.analysis.request_timeout_seconds == 0 {
            self.analysis.request_timeout_seconds = default_request_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        for (name, key) in [
            ("Enrichment", &self.enrichment.api_key),
            ("Completion", &self.completion.api_key),
        ] {
            if let Some(api_key) = key {
                if api_key.trim().is_empty() {
                    return Err(TowerIntelError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Tower store", self.tower_store.timeout_seconds),
            ("Enrichment", self.enrichment.timeout_seconds),
            ("Completion", self.completion.timeout_seconds),
        ] {
            if timeout > 300 {
                return Err(TowerIntelError::config(format!(
                    "{name} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.tower_store.max_retries > 10 || self.enrichment.max_retries > 10 {
            return Err(TowerIntelError::config("HTTP max retries cannot exceed 10").into());
        }

        if self.cache.ttl_seconds > 7 * 24 * 60 * 60 {
            return Err(TowerIntelError::config("Cache TTL cannot exceed 1 week").into());
        }

        if self.analysis.default_radius_meters > 100_000.0 {
            return Err(TowerIntelError::config("Default radius cannot exceed 100 km").into());
        }

        if self.analysis.max_concurrency > 64 {
            return Err(
                TowerIntelError::config("Comparator concurrency cannot exceed 64").into(),
            );
        }

        if self.analysis.request_timeout_seconds > 600 {
            return Err(
                TowerIntelError::config("Request timeout cannot exceed 600 seconds").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TowerIntelError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TowerIntelError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Tower store", &self.tower_store.base_url),
            ("Enrichment", &self.enrichment.base_url),
            ("Completion", &self.completion.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TowerIntelError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
