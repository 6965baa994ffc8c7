use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::MessageResponse;
use super::{ApiError, ApiResponse, AppState};
use crate::auth::policy::{Role, require_admin};
use crate::auth::Identity;
use crate::db::{User, UserUpdate};
use crate::services::CreateUser;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub user_type: Role,
}

#[derive(Deserialize)]
pub struct EditUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub user_type: Option<Role>,
}

#[derive(Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub user_type: String,
    pub must_change_password: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            user_type: user.user_type,
            must_change_password: user.must_change_password,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct ResetPasswordResponse {
    /// One-time password, shown exactly once.
    pub password: String,
}

/// POST /users (admin)
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserOut>>, ApiError> {
    require_admin(&identity)?;

    let user = state
        .users
        .create_user(CreateUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            user_type: payload.user_type,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserOut::from(user))))
}

/// GET /users (admin)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<UserOut>>>, ApiError> {
    require_admin(&identity)?;

    let users = state.users.list_users().await?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserOut::from).collect(),
    )))
}

/// PUT /users/{id} (admin)
pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditUserRequest>,
) -> Result<Json<ApiResponse<UserOut>>, ApiError> {
    require_admin(&identity)?;

    let user = state
        .users
        .edit_user(
            id,
            UserUpdate {
                username: payload.username,
                email: payload.email,
                user_type: payload.user_type.map(|r| r.as_str().to_string()),
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(UserOut::from(user))))
}

/// DELETE /users/{id} (admin)
/// Cascades deletion of the user's TOTP secrets
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_admin(&identity)?;

    state.users.delete_user(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "User deleted".to_string(),
    })))
}

/// POST /users/{id}/reset-password (admin)
/// Resets to a random one-time password, returned once in the response
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ResetPasswordResponse>>, ApiError> {
    require_admin(&identity)?;

    let password = state.users.reset_password(id).await?;

    Ok(Json(ApiResponse::success(ResetPasswordResponse {
        password,
    })))
}
