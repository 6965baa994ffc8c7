use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::auth::Identity;
use crate::services::{AuthError, LoginResult};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: Option<String>,
    pub user_type: String,
    pub must_change_password: bool,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware: requires a valid `Authorization: Bearer <token>`
/// header, resolves it to an [`Identity`], and stashes the identity in the
/// request extensions for handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Err(ApiError::Unauthorized("Missing bearer token".to_string()));
    };

    let identity = state.auth.authenticate(&token)?;

    tracing::debug!("Authenticated request from {}", identity.username);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer` header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, returns a bearer token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /auth/me
/// Get current user information (requires authentication)
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let user = state.auth.current_user(&identity).await?;

    Ok(Json(ApiResponse::success(MeResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        user_type: user.user_type,
        must_change_password: user.must_change_password,
    })))
}

/// PUT /auth/password
/// Change own password (requires old password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth
        .change_password(&identity, &payload.old_password, &payload.new_password)
        .await
        .map_err(|e| match e {
            // Wrong old password on this endpoint is a bad request, not a
            // failed authentication: the caller already holds a valid token.
            AuthError::InvalidCredentials => {
                ApiError::validation("Current password is incorrect")
            }
            other => ApiError::from(other),
        })?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}
