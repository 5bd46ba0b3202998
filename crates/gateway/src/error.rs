use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use scanner::ScanError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Status, stable code and client-facing message.
    /// Backend details are logged here and never returned.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::InvalidRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::Scan(err) => {
                let status = match err {
                    ScanError::ArchiveReadFailure(_) => StatusCode::BAD_REQUEST,
                    ScanError::DecompressionFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    ScanError::AnalysisServiceFailure(_) | ScanError::AnalysisResponseMalformed(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    ScanError::Cancelled => StatusCode::CONFLICT,
                    ScanError::Config(_) | ScanError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(code = err.code(), "Request failed: {}", err);
                } else {
                    tracing::warn!(code = err.code(), "Request rejected: {}", err);
                }
                (status, err.code(), err.user_message().to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ScanError::ArchiveReadFailure("x".into()), StatusCode::BAD_REQUEST),
            (ScanError::DecompressionFailure("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ScanError::AnalysisServiceFailure("x".into()), StatusCode::BAD_GATEWAY),
            (ScanError::AnalysisResponseMalformed("x".into()), StatusCode::BAD_GATEWAY),
            (ScanError::Cancelled, StatusCode::CONFLICT),
            (ScanError::Worker("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_message_is_sanitized() {
        let (_, code, message) = ApiError::from(ScanError::Worker("panic at /src/lib.rs".into())).parts();
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("/src/lib.rs"));
    }
}
