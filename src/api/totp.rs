use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::MessageResponse;
use super::{ApiError, ApiResponse, AppState};
use crate::auth::Identity;
use crate::services::TotpEntry;

#[derive(Deserialize)]
pub struct AddTotpRequest {
    pub label: String,
    pub secret: String,
}

#[derive(Deserialize)]
pub struct SetDefaultRequest {
    pub label: String,
}

/// GET /totp
/// List the caller's TOTP secrets with codes computed at response time
pub async fn list_secrets(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<TotpEntry>>>, ApiError> {
    let entries = state.totp.list(&identity).await?;

    Ok(Json(ApiResponse::success(entries)))
}

/// POST /totp
/// Store a new TOTP secret under a per-user-unique label
pub async fn add_secret(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<AddTotpRequest>,
) -> Result<Json<ApiResponse<TotpEntry>>, ApiError> {
    let entry = state
        .totp
        .add(&identity, &payload.label, &payload.secret)
        .await?;

    Ok(Json(ApiResponse::success(entry)))
}

/// PUT /totp/default
/// Make the secret with the given label the caller's single default
pub async fn set_default(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<SetDefaultRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.totp.set_default(&identity, &payload.label).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Default updated".to_string(),
    })))
}

/// DELETE /totp/{id}
/// Delete one of the caller's TOTP secrets
pub async fn delete_secret(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.totp.delete(&identity, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Secret deleted".to_string(),
    })))
}
