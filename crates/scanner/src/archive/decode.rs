//! Decode — lossy-but-total text decoding of sampled windows.
//!
//! Policy: invalid UTF-8 is replaced with U+FFFD and counted, never
//! reported as an error. Window edges may split a multi-byte character;
//! that character degrades to U+FFFD the same way.

use std::borrow::Cow;

use super::window::SampledStream;

/// Human-visible marker placed between non-adjacent windows.
pub const GAP_MARKER: &str = "\n...[SKIPPED DATA]...\n";

#[derive(Debug, Clone, Default)]
pub struct DecodedExcerpt {
    pub text: String,
    /// A gap marker separates the head and tail text.
    pub gap_inserted: bool,
    /// At least one invalid byte sequence was replaced.
    pub replaced_sequences: bool,
}

/// Decode owned bytes, reusing the allocation when they are valid UTF-8.
pub fn decode_lossy(bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(err) => (String::from_utf8_lossy(err.as_bytes()).into_owned(), true),
    }
}

/// Decode both windows into one excerpt.
///
/// Gapped windows are decoded separately and joined with [`GAP_MARKER`].
/// Adjacent or overlapping windows are emitted once, contiguously: the part
/// of the tail already covered by the head is skipped.
pub fn decode_windows(stream: &SampledStream) -> DecodedExcerpt {
    if stream.is_gapped() {
        let head = String::from_utf8_lossy(stream.head.bytes());
        let tail = String::from_utf8_lossy(stream.tail.bytes());
        let head_replaced = matches!(head, Cow::Owned(_));
        let tail_replaced = matches!(tail, Cow::Owned(_));

        let mut text = String::with_capacity(head.len() + GAP_MARKER.len() + tail.len());
        text.push_str(&head);
        text.push_str(GAP_MARKER);
        text.push_str(&tail);

        return DecodedExcerpt {
            text,
            gap_inserted: true,
            replaced_sequences: head_replaced || tail_replaced,
        };
    }

    let head = stream.head.bytes();
    let tail = stream.tail.bytes();
    let overlap = (stream.head.range().end - stream.tail.range().start) as usize;
    let rest = &tail[overlap.min(tail.len())..];

    let mut joined = Vec::with_capacity(head.len() + rest.len());
    joined.extend_from_slice(head);
    joined.extend_from_slice(rest);
    let (text, replaced_sequences) = decode_lossy(joined);

    DecodedExcerpt {
        text,
        gap_inserted: false,
        replaced_sequences,
    }
}
