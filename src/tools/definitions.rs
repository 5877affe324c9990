//! Tool names, descriptions and input schemas

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Every tool the engine exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolName {
    AnalyzeLocation,
    SearchCellTowers,
    CorrectSpelling,
    AnalyzeVoiceQuery,
    ListTools,
    CompareLocations,
    GetTowerById,
    AnalyzeCoverage,
    GenerateLocationInsights,
}

impl ToolName {
    pub const ALL: [ToolName; 9] = [
        ToolName::AnalyzeLocation,
        ToolName::SearchCellTowers,
        ToolName::CorrectSpelling,
        ToolName::AnalyzeVoiceQuery,
        ToolName::ListTools,
        ToolName::CompareLocations,
        ToolName::GetTowerById,
        ToolName::AnalyzeCoverage,
        ToolName::GenerateLocationInsights,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::AnalyzeLocation => "analyze_location",
            ToolName::SearchCellTowers => "search_cell_towers",
            ToolName::CorrectSpelling => "correct_spelling",
            ToolName::AnalyzeVoiceQuery => "analyze_voice_query",
            ToolName::ListTools => "list_tools",
            ToolName::CompareLocations => "compare_locations",
            ToolName::GetTowerById => "get_tower_by_id",
            ToolName::AnalyzeCoverage => "analyze_coverage",
            ToolName::GenerateLocationInsights => "generate_location_insights",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            ToolName::AnalyzeLocation => {
                "Analyze a location for cell tower investment: score, factors, risks, revenue estimate and recommendations"
            }
            ToolName::SearchCellTowers => {
                "Search cell towers by free text or 'lat,lng', radio type and inclusive signal range (dBm)"
            }
            ToolName::CorrectSpelling => "Correct spelling errors in a search query",
            ToolName::AnalyzeVoiceQuery => {
                "Extract intent, location and filters from a voice query"
            }
            ToolName::ListTools => "List the available tools and their input schemas",
            ToolName::CompareLocations => {
                "Analyze several locations concurrently and rank them by score"
            }
            ToolName::GetTowerById => "Retrieve a single cell tower by its id",
            ToolName::AnalyzeCoverage => {
                "Coverage statistics for towers, optionally by radio type and bounding box"
            }
            ToolName::GenerateLocationInsights => {
                "Strategic insights paragraph for an analyzed location"
            }
        }
    }

    /// JSON Schema (draft 7) for the tool's arguments
    #[must_use]
    pub fn input_schema(self) -> Value {
        let latitude = json!({"type": "number", "minimum": -90, "maximum": 90, "description": "Latitude in decimal degrees"});
        let longitude = json!({"type": "number", "minimum": -180, "maximum": 180, "description": "Longitude in decimal degrees"});
        let radius = json!({"type": "number", "exclusiveMinimum": 0, "default": 5000, "description": "Search radius in meters"});

        match self {
            ToolName::AnalyzeLocation | ToolName::GenerateLocationInsights => json!({
                "type": "object",
                "properties": {"latitude": latitude, "longitude": longitude, "radius": radius},
                "required": ["latitude", "longitude"]
            }),
            ToolName::SearchCellTowers => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Free text, or 'lat,lng' to search around a point"},
                    "radioType": {"type": "string", "description": "GSM, UMTS, LTE, CDMA or NR"},
                    "minSignal": {"type": "number", "description": "Minimum average signal (dBm)"},
                    "maxSignal": {"type": "number", "description": "Maximum average signal (dBm)"}
                }
            }),
            ToolName::CorrectSpelling => json!({
                "type": "object",
                "properties": {"text": {"type": "string", "minLength": 1}},
                "required": ["text"]
            }),
            ToolName::AnalyzeVoiceQuery => json!({
                "type": "object",
                "properties": {"query": {"type": "string", "minLength": 1}},
                "required": ["query"]
            }),
            ToolName::ListTools => json!({"type": "object", "properties": {}}),
            ToolName::CompareLocations => json!({
                "type": "object",
                "properties": {
                    "locations": {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "properties": {
                                "latitude": latitude,
                                "longitude": longitude,
                                "name": {"type": "string"}
                            },
                            "required": ["latitude", "longitude"]
                        }
                    },
                    "radius": radius
                },
                "required": ["locations"]
            }),
            ToolName::GetTowerById => json!({
                "type": "object",
                "properties": {"id": {"type": "integer"}},
                "required": ["id"]
            }),
            ToolName::AnalyzeCoverage => json!({
                "type": "object",
                "properties": {
                    "radioType": {"type": "string"},
                    "minLat": {"type": "number"},
                    "maxLat": {"type": "number"},
                    "minLon": {"type": "number"},
                    "maxLon": {"type": "number"}
                }
            }),
        }
    }

    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What `list_tools` reports for one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::parse(tool.as_str()), Some(tool));
        }
        assert_eq!(ToolName::parse("does_not_exist"), None);
        assert_eq!(ToolName::parse("Analyze_Location"), None);
    }

    #[test]
    fn test_definition_uses_camel_case_schema_key() {
        let json = serde_json::to_value(ToolName::AnalyzeLocation.definition()).unwrap();
        assert_eq!(json["name"], "analyze_location");
        assert_eq!(json["inputSchema"]["required"], json!(["latitude", "longitude"]));
    }
}
