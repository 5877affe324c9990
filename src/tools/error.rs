//! Errors returned across the tool surface

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TowerIntelError;

/// Wire code of a tool error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    /// Numeric JSON-RPC code for transports that need one
    #[must_use]
    pub fn rpc_code(self) -> i64 {
        match self {
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
        }
    }
}

/// Tool dispatch errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolError {
    /// Tool or method name not recognized
    #[error("Unknown tool: {0}")]
    MethodNotFound(String),
    /// Arguments missing or malformed
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    /// The handler failed
    #[error("Tool execution failed: {0}")]
    InternalError(String),
}

/// `{code, message}` body sent to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ToolError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            ToolError::MethodNotFound(_) => ErrorCode::MethodNotFound,
            ToolError::InvalidParams(_) => ErrorCode::InvalidParams,
            ToolError::InternalError(_) => ErrorCode::InternalError,
        }
    }

    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<TowerIntelError> for ToolError {
    fn from(err: TowerIntelError) -> Self {
        match err {
            TowerIntelError::Validation { message } => ToolError::InvalidParams(message),
            other => ToolError::InternalError(other.to_string()),
        }
    }
}

impl Serialize for ToolError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body().serialize(serializer)
    }
}
