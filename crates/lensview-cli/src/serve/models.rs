//! API request/response models for the resolver server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use lensview_core::ApiError;

// =============================================================================
// Request Models
// =============================================================================

/// Query parameters for `/api/lenses`.
///
/// Both are required; they stay optional here so the resolver reports
/// which one is missing.
#[derive(Debug, Deserialize)]
pub struct LensPage {
    pub first: Option<i64>,
    pub offset: Option<i64>,
}

// =============================================================================
// Response Models
// =============================================================================

/// Health check body.
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// Error body returned for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Maps resolver errors to HTTP responses.
///
/// Argument errors are the caller's fault (400); anything else means the
/// graph database could not be queried (502).
pub struct ApiErrorResponse(pub ApiError);

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::BAD_GATEWAY
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
