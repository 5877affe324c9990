//! Error types and handling for the `TowerIntel` engine

use thiserror::Error;

/// Main error type for the `TowerIntel` engine
#[derive(Error, Debug)]
pub enum TowerIntelError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A collaborator (tower store, enrichment, completion) could not be reached
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },

    /// A collaborator answered with something we could not use
    #[error("Malformed response from {service}: {message}")]
    MalformedUpstreamResponse { service: String, message: String },

    /// An operation exceeded the per-request deadline
    #[error("Timed out while {operation}")]
    Timeout { operation: String },

    /// A requested record does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TowerIntelError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new upstream-unavailable error
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new malformed-response error
    pub fn malformed<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::MalformedUpstreamResponse {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Whether repeating the same call later could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TowerIntelError::UpstreamUnavailable { .. } | TowerIntelError::Timeout { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TowerIntelError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TowerIntelError::Validation { message } => format!("Invalid input: {message}"),
            TowerIntelError::UpstreamUnavailable { service, .. } => {
                format!("Unable to reach {service}. Please try again later.")
            }
            TowerIntelError::MalformedUpstreamResponse { service, .. } => {
                format!("{service} returned data that could not be understood.")
            }
            TowerIntelError::Timeout { operation } => {
                format!("The request took too long while {operation}.")
            }
            TowerIntelError::NotFound { message } => message.clone(),
            TowerIntelError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TowerIntelError::General { message } => message.clone(),
        }
    }
}

impl From<reqwest_middleware::Error> for TowerIntelError {
    fn from(err: reqwest_middleware::Error) -> Self {
        TowerIntelError::upstream("http", err.to_string())
    }
}
