//! HTTP error rendering.
//!
//! Every handler returns [`ApiResult`]; the response body is a uniform
//! `{"error": …}` object. Authorization failures carry no detail and
//! internal failures are logged server-side but rendered generically.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mallops_access::AccessError;
use mallops_core::error::MallopsError;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(MallopsError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<MallopsError> for ApiError {
    fn from(err: MallopsError) -> Self {
        Self(err)
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self(MallopsError::from(err))
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(MallopsError::Validation {
            message: message.into(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            MallopsError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            MallopsError::AlreadyExists { .. } | MallopsError::InvalidState { .. } => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            MallopsError::Validation { message } => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            MallopsError::AuthenticationFailed { reason } => {
                (StatusCode::UNAUTHORIZED, reason.clone())
            }
            MallopsError::AuthorizationDenied { .. } => {
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }
            MallopsError::Database(_) | MallopsError::Internal(_) => {
                error!(error = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
