use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

/// ApiError
///
/// Every HTTP-level failure the service can produce. The gate only ever emits
/// `BadRequest`, `Unauthorized` and `Forbidden`; the remaining variants come from forwarding
/// traffic to the upstream application.
///
/// The `Display` text doubles as the `message` field of the JSON body, so it must
/// never mention why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Malformed request path")]
    BadRequest,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Admin access required")]
    Forbidden,
    #[error("Upstream request failed")]
    BadGateway,
    #[error("Request body exceeds the forwarding limit")]
    PayloadTooLarge,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadGateway => StatusCode::BAD_GATEWAY,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Short machine-readable label placed in the `error` field.
    pub fn label(&self) -> &'static str {
        match self {
            ApiError::BadRequest => "Bad Request",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::Forbidden => "Forbidden",
            ApiError::BadGateway => "Bad Gateway",
            ApiError::PayloadTooLarge => "Payload Too Large",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.label().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
