//! Error types for the Partner API service.
//!
//! Clients only ever learn the class of a failure. The internal kind is
//! logged with the request and kept out of the body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use partner_auth_core::AuthError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request format")]
    InvalidRequest(#[source] JsonRejection),

    /// Missing or invalid bearer token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Unauthorized")]
    LoginFailed(#[source] AuthError),

    #[error("Invalid refresh token")]
    RefreshFailed(#[source] AuthError),

    #[error("Failed to logout")]
    LogoutFailed(#[source] AuthError),

    #[error("User not found")]
    UserNotFound,

    #[error("Internal server error")]
    Database(#[from] partner_db::DbError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::LoginFailed(_) | Self::RefreshFailed(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::LogoutFailed(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "BAD_REQUEST",
            Self::Unauthorized | Self::LoginFailed(_) => "UNAUTHORIZED",
            Self::RefreshFailed(_) => "INVALID_REFRESH_TOKEN",
            Self::LogoutFailed(_) => "LOGOUT_FAILED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    /// Internal kind for logs, when the failure came from the auth core
    fn auth_kind(&self) -> Option<&'static str> {
        match self {
            Self::LoginFailed(e) | Self::RefreshFailed(e) | Self::LogoutFailed(e) => {
                Some(e.error_code())
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, kind = self.auth_kind(), "Server error: {}", self);
        } else {
            tracing::warn!(kind = self.auth_kind(), "Client error: {}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
