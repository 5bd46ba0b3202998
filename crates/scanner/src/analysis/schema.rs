//! Schema — the fixed structured answer and its JSON schema.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Every field is required and unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalysisResult {
    pub last_seen_date: String,
    pub location_context: String,
    pub signal_strength_analysis: String,
    pub battery_status: String,
    pub confidence_level: Confidence,
    pub summary: String,
    pub next_steps: Vec<String>,
}

impl AnalysisResult {
    /// Strict parse of the service's text answer.
    pub fn parse_strict(text: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(text.trim()).map_err(|e| AnalysisError::Malformed(e.to_string()))
    }
}

/// Response schema sent with every request (OpenAPI subset).
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "lastSeenDate": {
                "type": "STRING",
                "description": "Human-readable date and time of the last connection or LastSeen detection"
            },
            "locationContext": {
                "type": "STRING",
                "description": "Inferred location or activity, e.g. \"at home on WiFi X\", \"moving\", \"unknown\""
            },
            "signalStrengthAnalysis": {
                "type": "STRING",
                "description": "Analysis of RSSI values or LastSeen data before the loss"
            },
            "batteryStatus": {
                "type": "STRING",
                "description": "Last known battery percentage or state"
            },
            "confidenceLevel": {
                "type": "STRING",
                "enum": ["High", "Medium", "Low"]
            },
            "summary": {
                "type": "STRING",
                "description": "Conversational summary of what happened, naming the clues used (such as statedump)"
            },
            "nextSteps": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Suggested next steps for the user"
            }
        },
        "required": [
            "lastSeenDate",
            "locationContext",
            "signalStrengthAnalysis",
            "batteryStatus",
            "confidenceLevel",
            "summary",
            "nextSteps"
        ]
    })
}
