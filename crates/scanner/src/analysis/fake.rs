//! Fake — test double for the analysis service.
//!
//! [`FakeAnalysis`] answers with a canned result or error, optionally after a
//! delay, and counts calls. Used by session and gateway tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::schema::{AnalysisResult, Confidence};
use super::{AnalysisError, AnalysisFuture, AnalysisService};
use crate::chunk::LogChunk;

pub struct FakeAnalysis {
    answer: Result<AnalysisResult, AnalysisError>,
    delay: Option<Duration>,
    configured: bool,
    calls: AtomicUsize,
    last_chunks: Mutex<Vec<LogChunk>>,
}

impl FakeAnalysis {
    pub fn with_result(result: AnalysisResult) -> Self {
        Self {
            answer: Ok(result),
            delay: None,
            configured: true,
            calls: AtomicUsize::new(0),
            last_chunks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_error(error: AnalysisError) -> Self {
        Self {
            answer: Err(error),
            ..Self::with_result(Self::sample_result())
        }
    }

    /// Wait this long before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Chunks passed to the most recent call.
    pub fn last_chunks(&self) -> Vec<LogChunk> {
        self.last_chunks.lock().clone()
    }

    pub fn sample_result() -> AnalysisResult {
        AnalysisResult {
            last_seen_date: "2026-10-11 09:41".to_string(),
            location_context: "At home, connected to home WiFi".to_string(),
            signal_strength_analysis: "RSSI fell from -62 to -91 before the last disconnect".to_string(),
            battery_status: "40%".to_string(),
            confidence_level: Confidence::Medium,
            summary: "The Pencil appears in a statedump with a recent LastSeen tick.".to_string(),
            next_steps: vec!["Search near the desk".to_string()],
        }
    }
}

impl AnalysisService for FakeAnalysis {
    fn analyze<'a>(&'a self, chunks: &'a [LogChunk]) -> AnalysisFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_chunks.lock() = chunks.to_vec();
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answer.clone()
        })
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
