//! Session — one in-flight request at a time, cancellable by drop.
//!
//! [`AnalysisSession::begin`] hands out a [`RequestHandle`] and cancels the
//! previous one. Each stage of a request races the handle's token, so a
//! replaced, reset or dropped request resolves to [`ScanError::Cancelled`]
//! and its output is discarded.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::analysis::{AnalysisResult, AnalysisService};
use crate::error::ScanError;
use crate::pipeline::{ScanReport, Scanner};

/// Where the uploaded object comes from.
#[derive(Debug, Clone)]
pub enum ByteSource {
    Memory { name: String, data: Bytes },
    File(PathBuf),
}

impl ByteSource {
    pub fn memory(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        ByteSource::Memory {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            ByteSource::Memory { name, .. } => name.clone(),
            ByteSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Read the whole object, refusing anything above `limit` bytes.
    pub async fn read(self, limit: u64) -> Result<(String, Bytes), ScanError> {
        let name = self.name();
        let data = match self {
            ByteSource::Memory { data, .. } => data,
            ByteSource::File(path) => {
                let meta = tokio::fs::metadata(&path)
                    .await
                    .map_err(|e| ScanError::ArchiveReadFailure(format!("{}: {}", path.display(), e)))?;
                if meta.len() > limit {
                    return Err(oversize(meta.len(), limit));
                }
                let data = tokio::fs::read(&path)
                    .await
                    .map_err(|e| ScanError::ArchiveReadFailure(format!("{}: {}", path.display(), e)))?;
                Bytes::from(data)
            }
        };
        if data.len() as u64 > limit {
            return Err(oversize(data.len() as u64, limit));
        }
        Ok((name, data))
    }
}

fn oversize(len: u64, limit: u64) -> ScanError {
    ScanError::ArchiveReadFailure(format!("input of {} bytes exceeds limit of {} bytes", len, limit))
}

/// Reduction report plus the service's structured answer.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub report: ScanReport,
    pub result: AnalysisResult,
}

struct InFlight {
    id: u64,
    token: CancellationToken,
}

type Slot = Arc<Mutex<Option<InFlight>>>;

pub struct AnalysisSession {
    scanner: Arc<Scanner>,
    slot: Slot,
    generation: AtomicU64,
}

impl AnalysisSession {
    pub fn new(scanner: Arc<Scanner>) -> Self {
        Self {
            scanner,
            slot: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn scanner(&self) -> &Arc<Scanner> {
        &self.scanner
    }

    /// Start a new request, cancelling whatever was in flight.
    pub fn begin(&self) -> RequestHandle {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let previous = self.slot.lock().replace(InFlight {
            id,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            info!(replaced = previous.id, request_id = id, "Replacing in-flight request");
            previous.token.cancel();
        }

        RequestHandle {
            id,
            token,
            scanner: Arc::clone(&self.scanner),
            slot: Arc::clone(&self.slot),
        }
    }

    /// Cancel the in-flight request. Returns whether there was one.
    pub fn reset(&self) -> bool {
        match self.slot.lock().take() {
            Some(in_flight) => {
                info!(request_id = in_flight.id, "Resetting session");
                in_flight.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Id of the live request, if any.
    pub fn in_flight(&self) -> Option<u64> {
        self.slot
            .lock()
            .as_ref()
            .filter(|in_flight| !in_flight.token.is_cancelled())
            .map(|in_flight| in_flight.id)
    }
}

pub struct RequestHandle {
    id: u64,
    token: CancellationToken,
    scanner: Arc<Scanner>,
    slot: Slot,
}

impl RequestHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    async fn guarded<F: Future>(&self, fut: F) -> Result<F::Output, ScanError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ScanError::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Read the source and reduce it on a blocking worker.
    pub async fn reduce(&self, source: ByteSource) -> Result<ScanReport, ScanError> {
        let limit = self.scanner.max_input_bytes();
        let (name, data) = self.guarded(source.read(limit)).await??;
        debug!(request_id = self.id, file_name = %name, bytes = data.len(), "Source read");

        let scanner = Arc::clone(&self.scanner);
        let worker = tokio::task::spawn_blocking(move || scanner.reduce(&data, &name));
        let report = self
            .guarded(worker)
            .await?
            .map_err(|e| ScanError::Worker(e.to_string()))??;
        Ok(report)
    }

    /// Reduce the source, then hand the chunks to `service`.
    pub async fn run(&self, source: ByteSource, service: &dyn AnalysisService) -> Result<Analysis, ScanError> {
        let report = self.reduce(source).await?;
        let result = self.guarded(service.analyze(&report.chunks)).await??;
        if self.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        info!(request_id = self.id, confidence = ?result.confidence_level, "Analysis complete");
        Ok(Analysis { report, result })
    }
}

impl Drop for RequestHandle {
    fn drop(&mut self) {
        self.token.cancel();
        let mut slot = self.slot.lock();
        if slot.as_ref().map(|in_flight| in_flight.id) == Some(self.id) {
            *slot = None;
        }
    }
}
