//! Source — decide how an uploaded object is turned into a byte stream.

use serde::{Deserialize, Serialize};

/// gzip magic bytes (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Suffixes advertised to the user. Only gzip and plain text are processed;
/// a bare `.tar` goes down the gzip path and is rejected there.
pub const ACCEPTED_SUFFIXES: &[&str] = &[".tar.gz", ".tgz", ".gz", ".tar", ".log", ".txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// One or more concatenated gzip members.
    Gzip,
    /// An uncompressed log sampled as-is.
    PlainText,
}

impl SourceKind {
    /// Sniff the source kind from the leading bytes and the file name.
    ///
    /// The magic wins over the name. Without the magic, only `.log` / `.txt`
    /// names are treated as text; everything else is assumed to be gzip so
    /// that a bad upload fails loudly instead of being scanned as noise.
    pub fn sniff(file_name: &str, header: &[u8]) -> Self {
        if is_gzip_magic(header) {
            return SourceKind::Gzip;
        }
        if is_text_log_name(file_name) {
            SourceKind::PlainText
        } else {
            SourceKind::Gzip
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Gzip => "gzip",
            SourceKind::PlainText => "plain_text",
        }
    }
}

#[inline]
pub fn is_gzip_magic(header: &[u8]) -> bool {
    header.len() >= 2 && header[0] == GZIP_MAGIC[0] && header[1] == GZIP_MAGIC[1]
}

pub fn is_text_log_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".log") || lower.ends_with(".txt")
}
