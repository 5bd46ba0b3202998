//! Analysis module — the boundary to the external language-model service.
//!
//! The pipeline depends only on [`AnalysisService`]; [`GeminiClient`] is the
//! production transport and [`FakeAnalysis`] the test double.

pub mod schema;
pub mod prompt;
pub mod gemini;
pub mod fake;

pub use fake::FakeAnalysis;
pub use gemini::GeminiClient;
pub use schema::{AnalysisResult, Confidence};

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::chunk::LogChunk;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No credential, transport failure, bad status or empty answer.
    #[error("analysis service unavailable: {0}")]
    Unavailable(String),
    /// The answer did not match the response schema.
    #[error("analysis response malformed: {0}")]
    Malformed(String),
}

pub type AnalysisFuture<'a> = Pin<Box<dyn Future<Output = Result<AnalysisResult, AnalysisError>> + Send + 'a>>;

/// Object-safe async interface over the analysis backend.
///
/// Implementations must be `Send + Sync` so they can be shared behind an `Arc`.
pub trait AnalysisService: Send + Sync {
    fn analyze<'a>(&'a self, chunks: &'a [LogChunk]) -> AnalysisFuture<'a>;

    /// Whether a credential is available. Reported by health checks.
    fn is_configured(&self) -> bool {
        true
    }
}
