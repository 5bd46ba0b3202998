//! Archive module — source sniffing, bounded-window sampling, lossy decoding.
//!
//! The sampler never walks an archive's file table. It streams the
//! decompressed bytes once and keeps only a head window and a tail window.

pub mod source;
pub mod window;
pub mod sampler;
pub mod decode;
mod ring;

pub use decode::{decode_windows, DecodedExcerpt, GAP_MARKER};
pub use sampler::Sampler;
pub use source::{SourceKind, ACCEPTED_SUFFIXES};
pub use window::{ByteWindow, SampledStream, WindowOrigin};
