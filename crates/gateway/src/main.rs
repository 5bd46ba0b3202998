mod config;
mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use scanner::{GeminiClient, Scanner};
use tracing::{info, warn};

use crate::{
    config::{GatewayConfig, LogFormat, LogOutput},
    routes::build_router,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Phase 1: thread-local subscriber so config loading can log.
    // Replaced by the global subscriber in phase 2.
    let _basic_tracing = init_tracing_basic();

    info!("Starting Pencil Scan Gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = GatewayConfig::load().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let scanner_config = config
        .resolve_scanner(|key| std::env::var(key).ok())
        .context("Failed to resolve scanner configuration")?;
    scanner_config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Scanner configuration validation failed")?;

    // Phase 2: free the thread-local slot, then install the configured subscriber
    drop(_basic_tracing);
    init_tracing_from_config(&config)?;

    info!("Configuration loaded successfully");
    info!(
        window_size = scanner_config.sampler.window_size,
        max_lines = scanner_config.filter.max_lines,
        model = %scanner_config.analysis.model,
        "Scanner configured"
    );

    let analysis = Arc::new(GeminiClient::new(&scanner_config.analysis));
    if scanner_config.analysis.api_key.is_none() {
        warn!("No analysis API key configured (GEMINI_API_KEY / API_KEY); /api/analyze will fail");
    }

    let scanner = Scanner::new(&scanner_config).context("Failed to build scanner")?;
    let state = AppState::new(config.clone(), scanner, analysis);
    let app = build_router(state.clone());

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .context("Invalid bind address")?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Listening on: http://{}", addr);
    info!("  - Scan endpoint: http://{}/api/scan", addr);
    info!("  - Analyze endpoint: http://{}/api/analyze", addr);
    info!("  - Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.shutdown();

    info!("Server shut down gracefully");
    Ok(())
}

/// Phase 1: Basic tracing init so we can log during config loading.
/// Uses RUST_LOG env var or a sensible default.
fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gateway=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: install the global subscriber from `[logging]`.
fn init_tracing_from_config(config: &GatewayConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let open = |path: &str| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file '{}'", path))
    };

    match (&config.logging.format, &config.logging.output) {
        (LogFormat::Json, LogOutput::Stdout) => {
            let layer = fmt::layer().json().with_target(true).with_thread_ids(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Json, LogOutput::File { path }) => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(Arc::new(open(path)?));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::Stdout) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::File { path }) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false)
                .with_writer(Arc::new(open(path)?));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
