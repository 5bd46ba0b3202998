//! Error — the failure taxonomy surfaced to callers.
//!
//! Every variant is terminal for the current submission; nothing here is
//! retried. The "no signal" path is not an error, see
//! [`FilterOutcome::NoSignal`](crate::filter::FilterOutcome).

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::filter::FilterError;

#[derive(Error, Debug)]
pub enum ScanError {
    /// The byte source could not be obtained (I/O, oversize input).
    #[error("Failed to read archive: {0}")]
    ArchiveReadFailure(String),
    /// Not gzip, corrupt, or truncated (UnsupportedOrCorruptArchive).
    #[error("Unsupported or corrupt archive: {0}")]
    DecompressionFailure(String),
    #[error("Analysis service failure: {0}")]
    AnalysisServiceFailure(String),
    /// The service answered, but not in the declared schema.
    #[error("Malformed analysis response: {0}")]
    AnalysisResponseMalformed(String),
    #[error("Request was cancelled")]
    Cancelled,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Background worker failed: {0}")]
    Worker(String),
}

pub type ScanResult<T> = Result<T, ScanError>;

impl ScanError {
    /// Stable machine-readable code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::ArchiveReadFailure(_) => "ARCHIVE_READ_FAILED",
            ScanError::DecompressionFailure(_) => "UNSUPPORTED_ARCHIVE",
            ScanError::AnalysisServiceFailure(_) => "ANALYSIS_UNAVAILABLE",
            ScanError::AnalysisResponseMalformed(_) => "ANALYSIS_MALFORMED",
            ScanError::Cancelled => "CANCELLED",
            ScanError::Config(_) | ScanError::Worker(_) => "INTERNAL_ERROR",
        }
    }

    /// Fixed human-readable message. Never includes backend details.
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::ArchiveReadFailure(_) => {
                "Failed to read the file. Please select the file again."
            }
            ScanError::DecompressionFailure(_) => {
                "Invalid file format. Please upload a sysdiagnose archive in .tar.gz format."
            }
            ScanError::AnalysisServiceFailure(_) => {
                "The analysis service did not respond. Please try again."
            }
            ScanError::AnalysisResponseMalformed(_) => {
                "The analysis service returned a response that is not valid JSON for the expected format."
            }
            ScanError::Cancelled => "The request was cancelled.",
            ScanError::Config(_) | ScanError::Worker(_) => "An internal error occurred.",
        }
    }
}

impl From<FilterError> for ScanError {
    fn from(err: FilterError) -> Self {
        ScanError::Config(err.to_string())
    }
}

impl From<AnalysisError> for ScanError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Unavailable(msg) => ScanError::AnalysisServiceFailure(msg),
            AnalysisError::Malformed(msg) => ScanError::AnalysisResponseMalformed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_distinguish_format_from_read_failure() {
        let read = ScanError::ArchiveReadFailure("eof".into());
        let format = ScanError::DecompressionFailure("bad header".into());
        assert_ne!(read.code(), format.code());
        assert_ne!(read.user_message(), format.user_message());
    }

    #[test]
    fn test_user_message_hides_detail() {
        let err = ScanError::Worker("thread panicked at src/lib.rs:1".into());
        assert!(!err.user_message().contains("panicked"));
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_analysis_error_mapping() {
        let unavailable: ScanError = AnalysisError::Unavailable("timeout".into()).into();
        assert!(matches!(unavailable, ScanError::AnalysisServiceFailure(_)));

        let malformed: ScanError = AnalysisError::Malformed("missing field".into()).into();
        assert!(matches!(malformed, ScanError::AnalysisResponseMalformed(_)));
        assert_eq!(malformed.code(), "ANALYSIS_MALFORMED");
    }

    #[test]
    fn test_filter_error_is_config() {
        let err: ScanError = FilterError::EmptyVocabulary("keywords").into();
        assert!(matches!(err, ScanError::Config(_)));
    }
}
