//! Named-tool registry and request dispatch
//!
//! Each request moves through `Received -> Validated -> Dispatched` and ends
//! in `Completed` or `Failed`. Input schemas are compiled once when the
//! registry is built; each call is checked against its compiled schema before
//! the arguments are decoded into typed requests.

pub mod definitions;
pub mod error;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::{AnalysisService, LocationInput};
use crate::models::AnalysisRequest;
use crate::towers::{self, CoverageQuery, TowerSearch};
use crate::{Result, TowerIntelError};

pub use definitions::{ToolDefinition, ToolName};
pub use error::{ErrorBody, ErrorCode, ToolError};

/// Lifecycle of one tool request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Validated,
    Dispatched,
    Completed,
    Failed,
}

impl DispatchState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Completed | DispatchState::Failed)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Received => "received",
            DispatchState::Validated => "validated",
            DispatchState::Dispatched => "dispatched",
            DispatchState::Completed => "completed",
            DispatchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One block of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// Content envelope wrapping a successful tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: "text".to_string(),
                text: text.into(),
            }],
        }
    }

    /// Pretty-printed JSON of `value` as a text block
    pub fn json<T: Serialize>(value: &T) -> std::result::Result<Self, ToolError> {
        serde_json::to_string_pretty(value)
            .map(Self::text)
            .map_err(|e| ToolError::InternalError(format!("failed to serialise result: {e}")))
    }

    /// Text of the first block
    #[must_use]
    pub fn first_text(&self) -> &str {
        self.content.first().map_or("", |block| block.text.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct LocationArgs {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SpellingArgs {
    text: String,
}

#[derive(Debug, Deserialize)]
struct VoiceArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct CompareArgs {
    locations: Vec<LocationInput>,
    #[serde(default)]
    radius: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TowerIdArgs {
    id: i64,
}

fn decode<T: DeserializeOwned>(args: Value) -> std::result::Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

struct RegisteredTool {
    definition: ToolDefinition,
    schema: JSONSchema,
}

/// Maps tool names to their schemas and routes calls into the analysis service
pub struct ToolRegistry {
    service: Arc<AnalysisService>,
    tools: BTreeMap<ToolName, RegisteredTool>,
}

impl ToolRegistry {
    /// Register every tool, compiling its input schema. A schema that does
    /// not compile is a startup error.
    pub fn new(service: Arc<AnalysisService>) -> Result<Self> {
        let mut tools = BTreeMap::new();
        for name in ToolName::ALL {
            let definition = name.definition();
            let schema = JSONSchema::compile(&definition.input_schema).map_err(|e| {
                TowerIntelError::config(format!("invalid input schema for {name}: {e}"))
            })?;
            tools.insert(name, RegisteredTool { definition, schema });
        }
        tracing::debug!(count = tools.len(), "Tools registered");
        Ok(Self { service, tools })
    }

    #[must_use]
    pub fn service(&self) -> &Arc<AnalysisService> {
        &self.service
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| tool.definition.clone())
            .collect()
    }

    fn validate(&self, name: ToolName, args: &Value) -> std::result::Result<(), ToolError> {
        let tool = self
            .tools
            .get(&name)
            .ok_or_else(|| ToolError::MethodNotFound(name.to_string()))?;

        if let Err(errors) = tool.schema.validate(args) {
            let messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect();
            return Err(ToolError::InvalidParams(messages.join("; ")));
        }
        Ok(())
    }

    /// Run tool `name` with JSON `args`
    #[tracing::instrument(skip(self, args), fields(tool = name))]
    pub async fn dispatch(
        &self,
        name: &str,
        args: Value,
    ) -> std::result::Result<ToolResponse, ToolError> {
        let mut state = DispatchState::Received;
        tracing::debug!(%state, "Tool request");

        let args = if args.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            args
        };
        let logged_args = args.to_string();

        let outcome = match ToolName::parse(name) {
            None => Err(ToolError::MethodNotFound(name.to_string())),
            Some(tool) => match self.validate(tool, &args) {
                Err(e) => Err(e),
                Ok(()) => {
                    state = DispatchState::Validated;
                    tracing::debug!(%state, "Tool request");
                    state = DispatchState::Dispatched;
                    tracing::debug!(%state, "Tool request");
                    self.invoke(tool, args).await
                }
            },
        };

        match &outcome {
            Ok(_) => {
                state = DispatchState::Completed;
                tracing::debug!(%state, "Tool request");
            }
            Err(e) => {
                state = DispatchState::Failed;
                tracing::warn!(
                    %state,
                    tool = name,
                    args = %logged_args,
                    code = ?e.code(),
                    error = %e,
                    "Tool call failed"
                );
            }
        }
        debug_assert!(state.is_terminal());
        outcome
    }

    async fn invoke(
        &self,
        tool: ToolName,
        args: Value,
    ) -> std::result::Result<ToolResponse, ToolError> {
        let service = &self.service;
        match tool {
            ToolName::AnalyzeLocation => {
                let args: LocationArgs = decode(args)?;
                let analysis = service.analyze(self.request_for(&args)?).await?;
                ToolResponse::json(&analysis)
            }
            ToolName::SearchCellTowers => {
                let search: TowerSearch = decode(args)?;
                let towers = service.search_towers(&search).await?;
                ToolResponse::json(&towers)
            }
            ToolName::CorrectSpelling => {
                let args: SpellingArgs = decode(args)?;
                let corrected = service.assistant().correct_spelling(&args.text).await?;
                Ok(ToolResponse::text(corrected))
            }
            ToolName::AnalyzeVoiceQuery => {
                let args: VoiceArgs = decode(args)?;
                let analysis = service.assistant().analyze_voice_query(&args.query).await?;
                ToolResponse::json(&analysis)
            }
            ToolName::ListTools => ToolResponse::json(&self.list_tools()),
            ToolName::CompareLocations => {
                let args: CompareArgs = decode(args)?;
                let report = service.compare(args.locations, args.radius).await?;
                ToolResponse::json(&report)
            }
            ToolName::GetTowerById => {
                let args: TowerIdArgs = decode(args)?;
                let tower = service
                    .tower_store()
                    .tower_by_id(args.id)
                    .await?
                    .ok_or_else(|| {
                        TowerIntelError::not_found(format!("tower {} not found", args.id))
                    })?;
                ToolResponse::json(&tower)
            }
            ToolName::AnalyzeCoverage => {
                let query: CoverageQuery = decode(args)?;
                let report = towers::analyze_coverage(service.tower_store(), &query).await?;
                ToolResponse::json(&report)
            }
            ToolName::GenerateLocationInsights => {
                let args: LocationArgs = decode(args)?;
                let analysis = service.analyze(self.request_for(&args)?).await?;
                let insights = service.assistant().generate_location_insights(&analysis).await;
                Ok(ToolResponse::text(insights))
            }
        }
    }

    fn request_for(&self, args: &LocationArgs) -> Result<AnalysisRequest> {
        AnalysisRequest::new(
            args.latitude,
            args.longitude,
            args.radius
                .unwrap_or(self.service.settings().default_radius_meters),
        )
    }
}
