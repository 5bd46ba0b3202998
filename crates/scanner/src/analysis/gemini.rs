//! Gemini — `generateContent` transport for [`AnalysisService`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::prompt::build_prompt;
use super::schema::{response_schema, AnalysisResult};
use super::{AnalysisError, AnalysisFuture, AnalysisService};
use crate::chunk::LogChunk;
use crate::conf::AnalysisConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub struct GeminiClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    language: String,
}

impl GeminiClient {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn request_body(&self, chunks: &[LogChunk]) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_prompt(chunks, &self.language)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        }
    }

    async fn generate(&self, chunks: &[LogChunk]) -> Result<AnalysisResult, AnalysisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::Unavailable("API key not configured".to_string()))?;

        let body = self.request_body(chunks);
        let start = Instant::now();
        info!(model = %self.model, chunks = chunks.len(), "Sending analysis request");

        let response = self
            .http_client
            .post(self.url())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Unavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Analysis service returned error: {}", error_text);
            return Err(AnalysisError::Unavailable(format!("service returned {}", status)));
        }

        let envelope: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Unavailable(format!("unreadable response: {}", e)))?;

        let text = envelope
            .text()
            .ok_or_else(|| AnalysisError::Unavailable("service returned no text".to_string()))?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            response_chars = text.len(),
            "Analysis response received"
        );

        AnalysisResult::parse_strict(&text)
    }
}

impl AnalysisService for GeminiClient {
    fn analyze<'a>(&'a self, chunks: &'a [LogChunk]) -> AnalysisFuture<'a> {
        Box::pin(self.generate(chunks))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(&AnalysisConfig {
            endpoint: "http://127.0.0.1:9/v1beta/".to_string(),
            api_key: api_key.map(str::to_string),
            ..AnalysisConfig::default()
        })
    }

    #[test]
    fn test_url_shape() {
        assert_eq!(
            client(None).url(),
            "http://127.0.0.1:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(client(None).request_body(&[LogChunk::fallback()])).expect("serialize");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["contents"][0]["role"], "user");
        let text = body["contents"][0]["parts"][0]["text"].as_str().expect("prompt text");
        assert!(text.contains("--- FILE: sysdiagnose_scan.log ---"));
    }

    #[test]
    fn test_envelope_text_joins_parts() {
        let envelope: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\""},{"text":":1}"}]}}]}"#,
        )
        .expect("envelope");
        assert_eq!(envelope.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_envelope_without_text() {
        let envelope: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).expect("envelope");
        assert!(envelope.text().is_none());
        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#).expect("envelope");
        assert!(blank.text().is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let c = client(None);
        assert!(!c.is_configured());
        let result = c.analyze(&[LogChunk::fallback()]).await;
        assert!(matches!(result, Err(AnalysisError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let result = client(Some("k")).analyze(&[LogChunk::fallback()]).await;
        assert!(matches!(result, Err(AnalysisError::Unavailable(_))));
    }
}
