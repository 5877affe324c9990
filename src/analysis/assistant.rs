//! Free-text helpers backed by the completion provider: spelling
//! correction, voice query parsing and strategic insights.
//!
//! Each helper degrades to a fixed answer when the provider fails.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::models::LocationAnalysis;
use crate::{Result, TowerIntelError};

pub const INSIGHTS_FALLBACK: &str = "Strategic insights unavailable at this time.";

const SERVICE: &str = "completion provider";

/// Signal bounds extracted from a voice query, in dBm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VoiceFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radio_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<SignalRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

/// Structured reading of a spoken query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceAnalysis {
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<VoiceFilters>,
}

impl VoiceAnalysis {
    /// Answer used whenever the provider output cannot be trusted
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            intent: "search".to_string(),
            location: None,
            filters: Some(VoiceFilters::default()),
        }
    }
}

/// Strict decode of the provider's voice analysis JSON
pub fn parse_voice_analysis(raw: &str) -> Result<VoiceAnalysis> {
    let mut analysis: VoiceAnalysis = serde_json::from_str(raw.trim())
        .map_err(|e| TowerIntelError::malformed(SERVICE, format!("voice analysis: {e}")))?;

    analysis.intent = analysis.intent.trim().to_lowercase();
    if analysis.intent.is_empty() {
        return Err(TowerIntelError::malformed(SERVICE, "voice analysis has empty intent"));
    }
    analysis.location = analysis
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("null"));
    Ok(analysis)
}

pub struct Assistant {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl Assistant {
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn complete(&self, request: CompletionRequest, operation: &str) -> Result<String> {
        tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| TowerIntelError::timeout(operation))?
    }

    /// Corrected text; the original text when the provider fails or answers with nothing
    pub async fn correct_spelling(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(TowerIntelError::validation("text must not be empty"));
        }

        let prompt = format!(
            "Correct any spelling errors in this text while maintaining the original meaning and intent. Return only the corrected text:\n\nOriginal: \"{text}\""
        );
        let request = CompletionRequest::text(
            "You are a helpful assistant that corrects spelling errors. Return only the corrected text.",
            prompt,
            100,
        );

        match self.complete(request, "correcting spelling").await {
            Ok(corrected) => {
                let corrected = corrected.trim().trim_matches('"').trim();
                if corrected.is_empty() {
                    Ok(text.to_string())
                } else {
                    Ok(corrected.to_string())
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Spelling correction failed, returning original text");
                Ok(text.to_string())
            }
        }
    }

    /// Intent, location and filters from a spoken query
    pub async fn analyze_voice_query(&self, query: &str) -> Result<VoiceAnalysis> {
        if query.trim().is_empty() {
            return Err(TowerIntelError::validation("query must not be empty"));
        }

        let prompt = format!(
            r#"Analyze this voice query about cell tower locations and extract the intent, location, and any filters. Return as JSON:

Query: "{query}"

Expected JSON format:
{{
  "intent": "search|analyze|compare|etc",
  "location": "extracted location or null",
  "filters": {{
    "radioType": "LTE|GSM|UMTS|etc",
    "signalStrength": {{"min": -90, "max": -70}},
    "area": "urban|rural|suburban"
  }}
}}"#
        );
        let request = CompletionRequest::json(
            "You analyze voice queries about telecom infrastructure and extract structured data. Return valid JSON.",
            prompt,
            200,
        );

        let parsed = self
            .complete(request, "analysing voice query")
            .await
            .and_then(|raw| parse_voice_analysis(&raw));
        Ok(parsed.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Voice query analysis failed, using default intent");
            VoiceAnalysis::fallback()
        }))
    }

    /// One strategic paragraph about a finished analysis
    pub async fn generate_location_insights(&self, analysis: &LocationAnalysis) -> String {
        let [coverage, fiber, population, business, signal] = analysis.factors.percentages();
        let prompt = format!(
            "Provide strategic insights for this location analysis:

Location: {lat}, {lng}
Overall Score: {score:.2}
Factors:
- Cell Coverage: {coverage}%
- Fiber Proximity: {fiber}%
- Population Density: {population}%
- Business Potential: {business}%
- Signal Strength: {signal}%

Estimated Monthly Revenue: ${revenue}

Provide a concise paragraph of strategic insights.",
            lat = analysis.location.lat,
            lng = analysis.location.lng,
            score = analysis.display_score(),
            revenue = analysis.estimated_revenue,
        );
        let request = CompletionRequest::text(
            "You provide strategic telecom infrastructure insights.",
            prompt,
            300,
        );

        match self.complete(request, "generating insights").await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => INSIGHTS_FALLBACK.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Insight generation failed");
                INSIGHTS_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalyzedLocation, FactorSet};
    use async_trait::async_trait;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl CompletionProvider for Fixed {
        async fn complete(&self, _request: CompletionRequest) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| TowerIntelError::upstream("completion provider", "down"))
        }
    }

    fn assistant(answer: Option<&'static str>) -> Assistant {
        Assistant::new(Arc::new(Fixed(answer)), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_spelling_corrected() {
        let fixed = assistant(Some("\"cell tower in Johannesburg\"\n"))
            .correct_spelling("cel towr in Johanesburg")
            .await
            .unwrap();
        assert_eq!(fixed, "cell tower in Johannesburg");
    }

    #[tokio::test]
    async fn test_spelling_falls_back_to_original() {
        let text = "cel towr";
        assert_eq!(assistant(None).correct_spelling(text).await.unwrap(), text);
        assert_eq!(assistant(Some("   ")).correct_spelling(text).await.unwrap(), text);
    }

    #[tokio::test]
    async fn test_spelling_rejects_empty_text() {
        let err = assistant(None).correct_spelling("  ").await.unwrap_err();
        assert!(matches!(err, TowerIntelError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_voice_query_parsed() {
        let raw = r#"{"intent": "Analyze", "location": "Sandton",
            "filters": {"radioType": "LTE", "signalStrength": {"min": -90, "max": -70}}}"#;
        let analysis = assistant(Some(raw))
            .analyze_voice_query("analyse LTE towers in Sandton")
            .await
            .unwrap();
        assert_eq!(analysis.intent, "analyze");
        assert_eq!(analysis.location.as_deref(), Some("Sandton"));
        let filters = analysis.filters.unwrap();
        assert_eq!(filters.radio_type.as_deref(), Some("LTE"));
        assert_eq!(filters.signal_strength.unwrap().max, Some(-70.0));
    }

    #[tokio::test]
    async fn test_voice_query_fallback_on_bad_schema() {
        for answer in [
            None,
            Some("not json"),
            Some(r#"{"location": "x"}"#),
            Some(r#"{"intent": ""}"#),
            Some(r#"{"intent": "search", "confidence": 0.9}"#),
            Some(r#"{"intent": "search", "filters": {"operator": "MTN"}}"#),
            Some(r#"{"intent": "search", "filters": {"signalStrength": {"avg": -80}}}"#),
        ] {
            let analysis = assistant(answer).analyze_voice_query("towers").await.unwrap();
            assert_eq!(analysis, VoiceAnalysis::fallback());
        }
        let json = serde_json::to_value(VoiceAnalysis::fallback()).unwrap();
        assert_eq!(json, serde_json::json!({"intent": "search", "filters": {}}));
    }

    #[test]
    fn test_parse_voice_analysis_rejects_unknown_fields() {
        let err = parse_voice_analysis(r#"{"intent": "analyze", "extra": true}"#).unwrap_err();
        assert!(err.to_string().contains("extra"), "{err}");
        assert!(parse_voice_analysis(r#"{"intent": "analyze", "location": null}"#).is_ok());
    }

    #[tokio::test]
    async fn test_insights_fallback() {
        let analysis = LocationAnalysis {
            score: 0.5,
            factors: FactorSet::uniform(0.5),
            recommendations: vec!["a".to_string()],
            risks: vec![],
            estimated_revenue: 9375,
            nearby_towers: 2,
            location: AnalyzedLocation {
                lat: -26.2041,
                lng: 28.0473,
                address: None,
            },
        };
        assert_eq!(
            assistant(None).generate_location_insights(&analysis).await,
            INSIGHTS_FALLBACK
        );
        assert_eq!(
            assistant(Some("Strong urban demand.")).generate_location_insights(&analysis).await,
            "Strong urban demand."
        );
    }
}
