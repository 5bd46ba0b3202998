use std::sync::Arc;

use scanner::{AnalysisService, AnalysisSession, Scanner};

use crate::config::GatewayConfig;

/// Shared application state (thread-safe)
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub session: Arc<AnalysisSession>,
    pub analysis: Arc<dyn AnalysisService>,
}

impl AppState {
    pub fn new(config: GatewayConfig, scanner: Scanner, analysis: Arc<dyn AnalysisService>) -> Self {
        Self {
            config: Arc::new(config),
            session: Arc::new(AnalysisSession::new(Arc::new(scanner))),
            analysis,
        }
    }

    pub fn scanner(&self) -> &Arc<Scanner> {
        self.session.scanner()
    }

    /// Cancel whatever is in flight. Called on shutdown.
    pub fn shutdown(&self) {
        if self.session.reset() {
            tracing::info!("Cancelled in-flight analysis on shutdown");
        }
    }
}
