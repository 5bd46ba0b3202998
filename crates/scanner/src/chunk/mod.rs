//! Chunk module — named, scored excerpts handed to the analysis service.

use serde::{Deserialize, Serialize};

use crate::filter::FilterOutcome;

pub const EXTRACTED_CHUNK_NAME: &str = "extracted_pencil_activity.log";
pub const FALLBACK_CHUNK_NAME: &str = "sysdiagnose_scan.log";

pub const STRONG_MATCH_SCORE: u8 = 10;
pub const FALLBACK_SCORE: u8 = 1;

pub const FALLBACK_CONTENT: &str = "No explicit 'Apple Pencil' records found in the quick scan window. AI will analyze general Bluetooth activity.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogChunk {
    pub file_name: String,
    pub content: String,
    /// Ordinal, higher is stronger.
    pub relevance_score: u8,
}

impl LogChunk {
    pub fn extracted(content: impl Into<String>) -> Self {
        Self {
            file_name: EXTRACTED_CHUNK_NAME.to_string(),
            content: content.into(),
            relevance_score: STRONG_MATCH_SCORE,
        }
    }

    pub fn fallback() -> Self {
        Self {
            file_name: FALLBACK_CHUNK_NAME.to_string(),
            content: FALLBACK_CONTENT.to_string(),
            relevance_score: FALLBACK_SCORE,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.relevance_score == FALLBACK_SCORE && self.file_name == FALLBACK_CHUNK_NAME
    }
}

/// Package a filter outcome. Always yields at least one non-empty chunk.
pub fn package(outcome: &FilterOutcome) -> Vec<LogChunk> {
    match outcome {
        FilterOutcome::Relevant(excerpt) if !excerpt.content.is_empty() => {
            vec![LogChunk::extracted(excerpt.content.clone())]
        }
        _ => vec![LogChunk::fallback()],
    }
}

/// Render chunks into one request body.
pub fn render(chunks: &[LogChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("--- FILE: {} ---\n{}", chunk.file_name, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Excerpt;

    #[test]
    fn test_no_signal_yields_fallback() {
        let chunks = package(&FilterOutcome::NoSignal { matched: 3 });
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].file_name, "sysdiagnose_scan.log");
        assert_eq!(chunks[0].relevance_score, 1);
        assert_eq!(chunks[0].content, FALLBACK_CONTENT);
        assert!(chunks[0].is_fallback());
    }

    #[test]
    fn test_relevant_yields_extracted_chunk() {
        let outcome = FilterOutcome::Relevant(Excerpt {
            lines: vec![],
            content: "stylus connected\nA2538 LastSeen 42".to_string(),
            dropped: 0,
        });
        let chunks = package(&outcome);
        assert_eq!(chunks, vec![LogChunk::extracted("stylus connected\nA2538 LastSeen 42")]);
        assert_eq!(chunks[0].relevance_score, 10);
    }

    #[test]
    fn test_empty_relevant_content_never_packaged() {
        let outcome = FilterOutcome::Relevant(Excerpt {
            lines: vec![],
            content: String::new(),
            dropped: 0,
        });
        assert!(package(&outcome)[0].is_fallback());
    }

    #[test]
    fn test_render_format() {
        let chunks = vec![LogChunk::extracted("a\nb"), LogChunk::fallback()];
        let body = render(&chunks);
        assert_eq!(
            body,
            format!(
                "--- FILE: extracted_pencil_activity.log ---\na\nb\n\n--- FILE: sysdiagnose_scan.log ---\n{}",
                FALLBACK_CONTENT
            )
        );
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let json = serde_json::to_value(LogChunk::fallback()).expect("serialize");
        assert_eq!(json["fileName"], "sysdiagnose_scan.log");
        assert_eq!(json["relevanceScore"], 1);
        assert!(json.get("file_name").is_none());
    }
}
