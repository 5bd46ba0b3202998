use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use scanner::archive::ACCEPTED_SUFFIXES;
use scanner::{Analysis, ByteSource, ScanError, ScanReport};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Name used when the client does not send one.
const DEFAULT_FILE_NAME: &str = "sysdiagnose.tar.gz";

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    file_name: Option<String>,
}

impl UploadParams {
    fn file_name(&self) -> String {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string()
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.server.enable_cors {
        let origins = state
            .config
            .server
            .cors_origins
            .iter()
            .filter_map(|s| s.parse::<axum::http::HeaderValue>().ok())
            .collect::<Vec<_>>();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        // Same-origin only
        CorsLayer::new()
    };

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    // Over-limit bodies surface as ArchiveReadFailure via `upload_body`
    let body_limit = usize::try_from(state.scanner().max_input_bytes()).unwrap_or(usize::MAX);

    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .route("/api/scan", post(scan_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/reset", post(reset_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(cors),
        )
        .with_state(state)
}

fn upload_body(body: Result<Bytes, BytesRejection>) -> ApiResult<Bytes> {
    let body = body.map_err(|rejection| ScanError::ArchiveReadFailure(rejection.body_text()))?;
    if body.is_empty() {
        return Err(ApiError::InvalidRequest("Request body is empty".to_string()));
    }
    Ok(body)
}

/// POST /api/scan — reduction only
async fn scan_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<ScanReport>> {
    let body = upload_body(body)?;
    let name = params.file_name();
    info!(file_name = %name, bytes = body.len(), "Scan requested");

    let scanner = Arc::clone(state.scanner());
    let report = tokio::task::spawn_blocking(move || scanner.reduce(&body, &name))
        .await
        .map_err(|e| ScanError::Worker(e.to_string()))??;

    Ok(Json(report))
}

/// POST /api/analyze — reduction plus analysis, replacing any in-flight request
async fn analyze_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<Analysis>> {
    let body = upload_body(body)?;
    let name = params.file_name();

    let handle = state.session.begin();
    info!(request_id = handle.id(), file_name = %name, bytes = body.len(), "Analysis requested");

    let analysis = handle
        .run(ByteSource::memory(name, body), state.analysis.as_ref())
        .await?;

    Ok(Json(analysis))
}

/// POST /api/reset — cancel the in-flight analysis
async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cancelled = state.session.reset();
    Json(json!({ "cancelled": cancelled }))
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "analysis_configured": state.analysis.is_configured(),
        "in_flight": state.session.in_flight(),
    }))
}

/// Root handler - shows API info
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Pencil Scan Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "scan": "/api/scan",
            "analyze": "/api/analyze",
            "reset": "/api/reset",
            "health": "/health"
        },
        "accepted_suffixes": ACCEPTED_SUFFIXES,
    }))
}
