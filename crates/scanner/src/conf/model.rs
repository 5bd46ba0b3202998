//! Model — ScannerConfig and related structs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::vocab::Vocabulary;

/// 20 MiB per sampled window.
pub const DEFAULT_WINDOW_SIZE: usize = 20 * 1024 * 1024;
/// Soft ceiling on the uploaded object (500 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 500 * 1024 * 1024;
/// Hard ceiling on the decompressed stream (4 GiB).
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: u64 = 4 * 1024 * 1024 * 1024;
pub const DEFAULT_MAX_LINES: usize = 800;
pub const DEFAULT_MIN_SIGNAL_CHARS: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub sampler: SamplerConfig,
    pub filter: FilterConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Maximum size of each of the head and tail windows.
    pub window_size: usize,
    pub max_input_bytes: u64,
    pub max_decompressed_bytes: u64,
}

/// Relevance filter tuning and rule vocabularies.
///
/// Vocabularies are plain literals, not regexes. `keywords`,
/// `state_dump_markers`, `device_name_markers` and `connectivity_sources`
/// match case-insensitively; the rest are case-sensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub max_lines: usize,
    pub min_signal_chars: usize,
    pub keywords: Vec<String>,
    pub identifiers: Vec<String>,
    pub state_dump_markers: Vec<String>,
    pub device_name_markers: Vec<String>,
    pub connectivity_sources: Vec<String>,
    pub device_markers: Vec<String>,
    pub signal_markers: Vec<String>,
    pub link_event_markers: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base URL of the Generative Language API (without the model path).
    pub endpoint: String,
    pub model: String,
    /// Never serialized back out; supplied via file or `GEMINI_API_KEY` / `API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Language the narrative fields should be written in.
    pub language: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            min_signal_chars: DEFAULT_MIN_SIGNAL_CHARS,
            keywords: owned(Vocabulary::KEYWORDS),
            identifiers: owned(Vocabulary::MODEL_IDENTIFIERS),
            state_dump_markers: owned(Vocabulary::STATE_DUMP_MARKERS),
            device_name_markers: owned(Vocabulary::DEVICE_NAME_MARKERS),
            connectivity_sources: owned(Vocabulary::CONNECTIVITY_SOURCES),
            device_markers: owned(Vocabulary::DEVICE_MARKERS),
            signal_markers: owned(Vocabulary::SIGNAL_MARKERS),
            link_event_markers: owned(Vocabulary::LINK_EVENT_MARKERS),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: 120,
            language: "Simplified Chinese".to_string(),
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("language", &self.language)
            .finish()
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ─────────────────────────────────────────────────

    #[test]
    fn test_sampler_defaults() {
        let cfg = SamplerConfig::default();
        assert_eq!(cfg.window_size, 20 * 1024 * 1024);
        assert_eq!(cfg.max_input_bytes, 500 * 1024 * 1024);
    }

    #[test]
    fn test_filter_defaults() {
        let cfg = FilterConfig::default();
        assert_eq!(cfg.max_lines, 800);
        assert_eq!(cfg.min_signal_chars, 50);
        assert!(cfg.keywords.iter().any(|k| k == "stylus"));
        assert!(cfg.identifiers.iter().any(|k| k == "A2538"));
        assert_eq!(cfg.connectivity_sources, vec!["bluetooth".to_string()]);
    }

    #[test]
    fn test_analysis_defaults_have_no_key() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.model, "gemini-2.5-flash");
        assert_eq!(cfg.timeout_secs, 120);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let cfg = AnalysisConfig {
            api_key: Some("secret-value".to_string()),
            ..AnalysisConfig::default()
        };
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    // ── Serialization ────────────────────────────────────────────

    #[test]
    fn test_api_key_never_serialized() {
        let cfg = ScannerConfig {
            analysis: AnalysisConfig {
                api_key: Some("secret-value".to_string()),
                ..AnalysisConfig::default()
            },
            ..ScannerConfig::default()
        };
        let toml_str = toml::to_string(&cfg).expect("Should serialize to TOML");
        assert!(!toml_str.contains("secret-value"));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml_str = r#"
            [filter]
            max_lines = 100
        "#;
        let cfg: ScannerConfig = toml::from_str(toml_str).expect("Should accept partial TOML");
        assert_eq!(cfg.filter.max_lines, 100);
        assert_eq!(cfg.filter.min_signal_chars, 50);
        assert_eq!(cfg.sampler.window_size, DEFAULT_WINDOW_SIZE);
    }
}
