//! Pipeline — sample, decode, filter, package.
//!
//! [`Scanner::reduce`] is synchronous and CPU-bound; async callers run it on
//! a blocking worker (see [`crate::session`]).

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::archive::{decode_windows, Sampler, SourceKind};
use crate::chunk::{package, LogChunk};
use crate::conf::ScannerConfig;
use crate::error::ScanError;
use crate::filter::RelevanceFilter;

/// Label a decompressed archive stream is filtered under. The stream mixes
/// every subsystem, so it never counts as a connectivity source.
pub const COMBINED_SOURCE_NAME: &str = "combined_logs.txt";

#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    pub source_kind: SourceKind,
    pub decompressed_bytes: u64,
    pub lines_scanned: usize,
    pub lines_matched: usize,
    pub lines_dropped: usize,
    pub gap_inserted: bool,
    pub replaced_sequences: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub chunks: Vec<LogChunk>,
    pub stats: ScanStats,
    pub scanned_at: DateTime<Utc>,
}

impl ScanReport {
    pub fn is_fallback(&self) -> bool {
        self.chunks.iter().all(LogChunk::is_fallback)
    }
}

pub struct Scanner {
    sampler: Sampler,
    filter: RelevanceFilter,
    max_input_bytes: u64,
}

impl Scanner {
    pub fn new(config: &ScannerConfig) -> Result<Self, ScanError> {
        config.validate().map_err(ScanError::Config)?;
        Ok(Self {
            sampler: Sampler::new(&config.sampler),
            filter: RelevanceFilter::new(&config.filter)?,
            max_input_bytes: config.sampler.max_input_bytes,
        })
    }

    pub fn max_input_bytes(&self) -> u64 {
        self.max_input_bytes
    }

    pub fn filter(&self) -> &RelevanceFilter {
        &self.filter
    }

    /// Reduce one uploaded object to analysis chunks.
    pub fn reduce(&self, input: &[u8], file_name: &str) -> Result<ScanReport, ScanError> {
        if input.len() as u64 > self.max_input_bytes {
            return Err(ScanError::ArchiveReadFailure(format!(
                "input of {} bytes exceeds limit of {} bytes",
                input.len(),
                self.max_input_bytes
            )));
        }

        let stream = self.sampler.sample(input, file_name)?;
        let decoded = decode_windows(&stream);
        if decoded.replaced_sequences {
            warn!(file_name, "Invalid UTF-8 replaced while decoding windows");
        }

        let source_name = match stream.kind {
            SourceKind::Gzip => COMBINED_SOURCE_NAME,
            SourceKind::PlainText => file_name,
        };
        let provenance = self.filter.provenance(source_name);
        let pass = self.filter.filter(&decoded.text, &provenance);
        let chunks = package(&pass.outcome);

        let stats = ScanStats {
            source_kind: stream.kind,
            decompressed_bytes: stream.total_len,
            lines_scanned: pass.scanned,
            lines_matched: pass.matched,
            lines_dropped: pass.dropped(),
            gap_inserted: decoded.gap_inserted,
            replaced_sequences: decoded.replaced_sequences,
        };

        info!(
            file_name,
            kind = stream.kind.as_str(),
            decompressed_bytes = stats.decompressed_bytes,
            matched = stats.lines_matched,
            dropped = stats.lines_dropped,
            relevant = pass.outcome.is_relevant(),
            "Scan complete"
        );

        Ok(ScanReport {
            chunks,
            stats,
            scanned_at: Utc::now(),
        })
    }
}
