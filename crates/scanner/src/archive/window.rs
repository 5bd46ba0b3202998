//! Window — immutable byte windows tagged with their origin and stream offsets.

use std::ops::Range;

use bytes::Bytes;
use serde::Serialize;

use super::source::SourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowOrigin {
    Head,
    Tail,
}

/// A contiguous slice of the decompressed stream.
#[derive(Debug, Clone)]
pub struct ByteWindow {
    origin: WindowOrigin,
    range: Range<u64>,
    bytes: Bytes,
}

impl ByteWindow {
    pub(crate) fn new(origin: WindowOrigin, start: u64, bytes: Bytes) -> Self {
        let end = start + bytes.len() as u64;
        Self {
            origin,
            range: start..end,
            bytes,
        }
    }

    pub fn origin(&self) -> WindowOrigin {
        self.origin
    }

    /// Offset range in the decompressed stream (end exclusive).
    pub fn range(&self) -> Range<u64> {
        self.range.clone()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Sampler output: exactly one head and one tail window.
#[derive(Debug, Clone)]
pub struct SampledStream {
    pub head: ByteWindow,
    pub tail: ByteWindow,
    /// True length of the decompressed stream, including skipped bytes.
    pub total_len: u64,
    pub kind: SourceKind,
}

impl SampledStream {
    /// Whether decompressed bytes between the two windows were skipped.
    pub fn is_gapped(&self) -> bool {
        self.tail.range.start > self.head.range.end
    }

    /// Bytes of decompressed content held by both windows.
    pub fn resident_bytes(&self) -> usize {
        self.head.len() + self.tail.len()
    }
}
