//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, CompletionRequest};
use crate::config::CompletionConfig;
use crate::http::{build_client, read_json};
use crate::{Result, TowerIntelError};

const SERVICE: &str = "completion provider";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiCompletion {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TowerIntelError::config("Completion API key is not configured"))?;

        Ok(Self {
            client: build_client(config.timeout_seconds, 0)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletion {
    #[tracing::instrument(level = "debug", skip(self, request), fields(json = request.json))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens.min(self.max_tokens),
            response_format: request.json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let payload = serde_json::to_vec(&body)
            .map_err(|e| TowerIntelError::general(format!("Failed to encode request: {e}")))?;

        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
            TowerIntelError::config("Completion API key is not a valid header value")
        })?;

        let response = self
            .client
            .post(self.chat_url())
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(payload)
            .send()
            .await
            .map_err(|e| TowerIntelError::upstream(SERVICE, e.to_string()))?;

        let chat: ChatResponse = read_json(response, SERVICE).await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TowerIntelError::malformed(SERVICE, "response contained no message"))
    }
}
