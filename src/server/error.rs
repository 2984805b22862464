//! Error-to-HTTP response conversion.
//!
//! Lets route handlers return `Result<T, ApiError>` and propagate
//! [`reelgate_core::Error`] with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reelgate_core::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Server error in API handler");
        }

        let body = json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
