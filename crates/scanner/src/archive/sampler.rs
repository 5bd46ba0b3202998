//! Sampler — stream the decompressed bytes once, keep a head and a tail window.
//!
//! # Invariants
//! - At most `2 × window_size` decompressed bytes are resident at any time
//!   (head buffer + tail ring), plus one fixed read buffer.
//! - Tail covers `max(0, len - window_size) .. len`, so for streams no longer
//!   than one window the head and tail are byte-identical.
//! - Any decoder error aborts the whole sample; no partial windows escape.

use std::io::{self, Read};

use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use tracing::debug;

use super::ring::TailRing;
use super::source::{is_gzip_magic, SourceKind};
use super::window::{ByteWindow, SampledStream, WindowOrigin};
use crate::conf::SamplerConfig;
use crate::error::ScanError;

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct Sampler {
    window_size: usize,
    max_decompressed_bytes: u64,
}

impl Sampler {
    pub fn new(config: &SamplerConfig) -> Self {
        Self {
            window_size: config.window_size,
            max_decompressed_bytes: config.max_decompressed_bytes,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Sample an uploaded object, sniffing gzip vs. plain text first.
    pub fn sample(&self, input: &[u8], file_name: &str) -> Result<SampledStream, ScanError> {
        match SourceKind::sniff(file_name, input) {
            SourceKind::Gzip => self.sample_gzip(input),
            SourceKind::PlainText => self.sample_reader(input, SourceKind::PlainText),
        }
    }

    /// Decompress a gzip buffer and sample it.
    ///
    /// Anything without the gzip magic is rejected up front, so a non-gzip
    /// buffer can never produce a partial result.
    pub fn sample_gzip(&self, input: &[u8]) -> Result<SampledStream, ScanError> {
        if !is_gzip_magic(input) {
            return Err(ScanError::DecompressionFailure(
                "missing gzip header".to_string(),
            ));
        }
        self.sample_reader(MultiGzDecoder::new(input), SourceKind::Gzip)
    }

    fn sample_reader<R: Read>(&self, mut reader: R, kind: SourceKind) -> Result<SampledStream, ScanError> {
        let window = self.window_size;
        let mut head: Vec<u8> = Vec::with_capacity(window.min(READ_CHUNK * 16));
        let mut tail = TailRing::new(window);
        let mut buf = vec![0u8; READ_CHUNK];
        let mut total: u64 = 0;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(stream_error(kind, e)),
            };

            total += n as u64;
            if total > self.max_decompressed_bytes {
                return Err(ScanError::DecompressionFailure(format!(
                    "decompressed stream exceeds {} bytes",
                    self.max_decompressed_bytes
                )));
            }

            let chunk = &buf[..n];
            if head.len() < window {
                let take = (window - head.len()).min(n);
                head.extend_from_slice(&chunk[..take]);
            }
            tail.push(chunk);
        }

        let tail_bytes = tail.into_contiguous();
        let tail_start = total - tail_bytes.len() as u64;
        let head = ByteWindow::new(WindowOrigin::Head, 0, Bytes::from(head));
        let tail = ByteWindow::new(WindowOrigin::Tail, tail_start, Bytes::from(tail_bytes));

        debug!(
            kind = kind.as_str(),
            total_len = total,
            head_len = head.len(),
            tail_start,
            "Sampled stream windows"
        );

        Ok(SampledStream {
            head,
            tail,
            total_len: total,
            kind,
        })
    }
}

fn stream_error(kind: SourceKind, err: io::Error) -> ScanError {
    match kind {
        SourceKind::Gzip => ScanError::DecompressionFailure(err.to_string()),
        SourceKind::PlainText => ScanError::ArchiveReadFailure(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(data).expect("gzip write");
        encoder.finish().expect("gzip finish")
    }

    fn sampler(window_size: usize) -> Sampler {
        Sampler::new(&SamplerConfig {
            window_size,
            ..SamplerConfig::default()
        })
    }

    fn numbered(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_small_input_head_equals_tail() {
        let data = b"line one\nline two\n".to_vec();
        let stream = sampler(1024).sample_gzip(&gzip(&data)).expect("sample");

        assert_eq!(stream.total_len, data.len() as u64);
        assert_eq!(stream.head.bytes().as_ref(), data.as_slice());
        assert_eq!(stream.head.bytes(), stream.tail.bytes());
        assert_eq!(stream.tail.range(), 0..data.len() as u64);
        assert!(!stream.is_gapped());
    }

    #[test]
    fn test_exactly_one_window_converges() {
        let data = numbered(4096);
        let stream = sampler(4096).sample_gzip(&gzip(&data)).expect("sample");
        assert_eq!(stream.head.bytes(), stream.tail.bytes());
    }

    #[test]
    fn test_large_input_windows_are_bounded() {
        let window = 1000;
        let data = numbered(250_000);
        let stream = sampler(window).sample_gzip(&gzip(&data)).expect("sample");

        assert_eq!(stream.total_len, 250_000);
        assert!(stream.resident_bytes() <= 2 * window);
        assert_eq!(stream.head.bytes().as_ref(), &data[..window]);
        assert_eq!(stream.tail.bytes().as_ref(), &data[data.len() - window..]);
        assert_eq!(stream.tail.range(), (250_000 - window as u64)..250_000);
        assert!(stream.is_gapped());
    }

    #[test]
    fn test_overlapping_windows_between_one_and_two_sizes() {
        let data = numbered(1500);
        let stream = sampler(1000).sample_gzip(&gzip(&data)).expect("sample");
        assert_eq!(stream.head.range(), 0..1000);
        assert_eq!(stream.tail.range(), 500..1500);
        assert!(!stream.is_gapped());
    }

    #[test]
    fn test_concatenated_members_are_one_stream() {
        let mut archive = gzip(b"first member\n");
        archive.extend(gzip(b"second member\n"));
        let stream = sampler(1024).sample_gzip(&archive).expect("sample");
        assert_eq!(stream.head.bytes().as_ref(), b"first member\nsecond member\n");
    }

    #[test]
    fn test_non_gzip_is_decompression_failure() {
        let result = sampler(1024).sample_gzip(b"definitely not gzip");
        assert!(matches!(result, Err(ScanError::DecompressionFailure(_))));
    }

    #[test]
    fn test_corrupt_body_is_decompression_failure() {
        let mut archive = gzip(&numbered(10_000));
        // Byte 10 starts the first deflate block; 0xff selects the reserved block type.
        let mid = archive.len() / 2;
        for byte in &mut archive[10..mid] {
            *byte = 0xff;
        }
        let result = sampler(1024).sample_gzip(&archive);
        assert!(matches!(result, Err(ScanError::DecompressionFailure(_))));
    }

    #[test]
    fn test_truncated_stream_is_decompression_failure() {
        let archive = gzip(&numbered(50_000));
        let truncated = &archive[..archive.len() / 2];
        let result = sampler(1024).sample_gzip(truncated);
        assert!(matches!(result, Err(ScanError::DecompressionFailure(_))));
    }

    #[test]
    fn test_decompressed_ceiling() {
        let s = Sampler::new(&SamplerConfig {
            window_size: 64,
            max_input_bytes: 1024,
            max_decompressed_bytes: 128,
        });
        let result = s.sample_gzip(&gzip(&vec![b'a'; 4096]));
        assert!(matches!(result, Err(ScanError::DecompressionFailure(_))));
    }

    #[test]
    fn test_plain_text_sampled_without_decompression() {
        let data = b"Oct 11 bluetoothd: Device connected\n";
        let stream = sampler(1024).sample(data, "bluetooth.log").expect("sample");
        assert_eq!(stream.kind, SourceKind::PlainText);
        assert_eq!(stream.head.bytes().as_ref(), data.as_slice());
    }

    #[test]
    fn test_plain_bytes_with_archive_name_rejected() {
        let result = sampler(1024).sample(b"hello", "sysdiagnose.tar.gz");
        assert!(matches!(result, Err(ScanError::DecompressionFailure(_))));
    }

    #[test]
    fn test_empty_gzip_yields_empty_windows() {
        let stream = sampler(1024).sample_gzip(&gzip(b"")).expect("sample");
        assert_eq!(stream.total_len, 0);
        assert!(stream.head.is_empty());
        assert!(stream.tail.is_empty());
    }
}
