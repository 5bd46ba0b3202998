// Domain-driven module structure for the stylus log scanner.

// Core infrastructure
pub mod conf;
pub mod error;

// Reduction pipeline
pub mod archive;
pub mod filter;
pub mod chunk;
pub mod pipeline;

// Analysis boundary
pub mod analysis;
pub mod session;

pub use conf::ScannerConfig;
pub use error::{ScanError, ScanResult};
pub use pipeline::{ScanReport, Scanner};
pub use session::{Analysis, AnalysisSession, ByteSource, RequestHandle};
pub use analysis::{AnalysisService, GeminiClient};
