//! Completion-backed recommendations with a fixed fallback list

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::models::FactorSet;
use crate::{Result, TowerIntelError};

pub const FALLBACK_RECOMMENDATIONS: [&str; 4] = [
    "Focus on areas with existing fiber infrastructure to reduce deployment costs",
    "Consider population growth trends in the surrounding areas",
    "Evaluate competitor tower density to identify underserved markets",
    "Assess terrain and building heights for optimal signal propagation",
];

const SYSTEM_PROMPT: &str = "You are a telecommunications infrastructure expert. Provide concise, actionable recommendations in JSON format.";
const MAX_TOKENS: u32 = 500;
const MAX_RECOMMENDATIONS: usize = 10;
const SERVICE: &str = "completion provider";

#[must_use]
pub fn fallback_recommendations() -> Vec<String> {
    FALLBACK_RECOMMENDATIONS.iter().map(|s| (*s).to_string()).collect()
}

/// Prompt listing the five factor percentages
#[must_use]
pub fn build_prompt(factors: &FactorSet) -> String {
    let [coverage, fiber, population, business, signal] = factors.percentages();
    format!(
        "As a telecommunications infrastructure expert, provide 3-5 specific, actionable recommendations for cell tower placement based on these factors:

Location Analysis Factors:
- Cell Coverage: {coverage}%
- Fiber Proximity: {fiber}%
- Population Density: {population}%
- Business Potential: {business}%
- Signal Strength: {signal}%

Provide concise recommendations focusing on:
1. Infrastructure investment priorities
2. Business opportunities
3. Risk mitigation
4. Market positioning

Return a JSON object with a \"recommendations\" array of recommendation strings."
    )
}

/// Validate completion output: a JSON array, or an object holding one under
/// `recommendations` or `array`, of 1 to 10 non-empty strings
pub fn parse_recommendations(raw: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| TowerIntelError::malformed(SERVICE, format!("not JSON: {e}")))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("recommendations").or_else(|| map.get("array")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(TowerIntelError::malformed(
                    SERVICE,
                    "object has no recommendations array",
                ));
            }
        },
        _ => {
            return Err(TowerIntelError::malformed(
                SERVICE,
                "expected an array or object",
            ));
        }
    };

    if items.is_empty() || items.len() > MAX_RECOMMENDATIONS {
        return Err(TowerIntelError::malformed(
            SERVICE,
            format!("expected 1-{MAX_RECOMMENDATIONS} recommendations, got {}", items.len()),
        ));
    }

    items
        .iter()
        .map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            other => Err(TowerIntelError::malformed(
                SERVICE,
                format!("recommendation is not a non-empty string: {other}"),
            )),
        })
        .collect()
}

pub struct RecommendationEngine {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn try_generate(&self, factors: &FactorSet, deadline: Instant) -> Result<Vec<String>> {
        if Instant::now() >= deadline {
            return Err(TowerIntelError::timeout("generating recommendations"));
        }
        let request = CompletionRequest::json(SYSTEM_PROMPT, build_prompt(factors), MAX_TOKENS);
        let raw = tokio::time::timeout_at(deadline, self.provider.complete(request))
            .await
            .map_err(|_| TowerIntelError::timeout("generating recommendations"))??;
        parse_recommendations(&raw)
    }

    /// Recommendations for `factors`. Never fails: any provider problem yields the fallback list.
    pub async fn generate(&self, factors: &FactorSet) -> Vec<String> {
        self.generate_until(factors, Instant::now() + self.timeout).await
    }

    /// Like [`generate`](Self::generate), but the provider only gets until
    /// `deadline`. A deadline already in the past yields the fallback list.
    #[tracing::instrument(level = "debug", skip(self, deadline))]
    pub async fn generate_until(&self, factors: &FactorSet, deadline: Instant) -> Vec<String> {
        match self.try_generate(factors, deadline).await {
            Ok(recommendations) => recommendations,
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation generation failed, using fallback");
                fallback_recommendations()
            }
        }
    }
}
