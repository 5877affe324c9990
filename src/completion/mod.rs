//! Text-completion capability used for recommendations and assistant tools

pub mod openai;

use async_trait::async_trait;

use crate::Result;

pub use openai::OpenAiCompletion;

/// One prompt to a completion provider
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    /// Ask the provider for a JSON object rather than free text
    pub json: bool,
}

impl CompletionRequest {
    pub fn text(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens,
            json: false,
        }
    }

    pub fn json(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            json: true,
            ..Self::text(system, prompt, max_tokens)
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Raw completion text. Callers validate anything structured.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Provider used when no API key is configured: every call fails, so each
/// caller takes its deterministic fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCompletion;

#[async_trait]
impl CompletionProvider for UnavailableCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<String> {
        Err(crate::TowerIntelError::upstream(
            "completion provider",
            "no completion API key configured",
        ))
    }
}
