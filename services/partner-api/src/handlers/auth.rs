//! Authentication handlers (login, refresh, logout)

use axum::extract::State;
use axum::Json;
use partner_types::{TokenPair, User};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extractors::ApiJson;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub firebase_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub diamonds: i64,
    /// RFC 3339
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            name: user.name,
            diamonds: user.diamonds,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
///
/// Exchange a Firebase ID token for an access/refresh pair
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .auth
        .login(&req.firebase_token)
        .await
        .map_err(ApiError::LoginFailed)?;

    Ok(Json(LoginResponse {
        tokens: outcome.tokens,
        user: outcome.user.into(),
    }))
}

/// POST /api/auth/refresh
///
/// Rotate a refresh token into a new pair
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let tokens = state
        .auth
        .refresh(&req.refresh_token)
        .await
        .map_err(ApiError::RefreshFailed)?;

    Ok(Json(tokens))
}

/// POST /api/auth/logout
///
/// Revoke a refresh token. Unknown tokens succeed.
pub async fn logout(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LogoutRequest>,
) -> ApiResult<Json<LogoutResponse>> {
    state
        .auth
        .logout(&req.refresh_token)
        .await
        .map_err(ApiError::LogoutFailed)?;

    Ok(Json(LogoutResponse {
        success: true,
        message: "Logout successfully",
    }))
}
