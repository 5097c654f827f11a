use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Serialize;

/// Error taxonomy of the refresh/caching core.
///
/// `Clone` is required because a single producer failure is fanned out to
/// every waiter coalesced on the same cache key.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("coordinates ({lat}, {lon}) are outside all forecast model grids")]
    OutOfGrid { lat: f64, lon: f64 },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            // OutOfGrid never leaves the aggregator as an HTTP error; if it
            // does, something routed a request it should not have.
            CoreError::OutOfGrid { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            CoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable kind label, also used in forecast error stubs.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "NotFound",
            CoreError::OutOfGrid { .. } => "OutOfGrid",
            CoreError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            CoreError::Timeout(_) => "Timeout",
            CoreError::Internal(_) => "Internal",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    pub path: String,
    pub method: String,
    pub timestamp: String,
}

/// Build the JSON error response for a request, in the shape the API
/// promises: `{ status, message, path, method, timestamp }`.
pub fn error_response(req: &HttpRequest, err: &CoreError) -> HttpResponse {
    let status = err.status_code();
    HttpResponse::build(status).json(ErrorBody {
        status: status.as_u16(),
        message: err.to_string(),
        path: req.path().to_string(),
        method: req.method().to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
