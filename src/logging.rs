//! Tracing subscriber setup
//!
//! Logs always go to stderr: the stdio transport owns stdout.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::{Result, TowerIntelError};

/// Filter directives for the configured level, keeping noisy HTTP crates quiet
#[must_use]
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    format!(
        "towerintel={level},tower_http={level},hyper=warn,reqwest=warn",
        level = config.level
    )
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_filter_directives(config)));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.format.as_str() {
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        _ => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| TowerIntelError::config(format!("Failed to initialise logging: {e}")))
}
