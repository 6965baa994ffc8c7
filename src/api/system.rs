use axum::{Extension, Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::auth::Identity;
use crate::auth::policy::require_admin;
use crate::config::Config;

#[derive(Serialize)]
pub struct StatusResponse {
    pub name: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database_ok: bool,
}

/// GET /system/status (any authenticated user)
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatusResponse>>, ApiError> {
    let database_ok = state.store.ping().await.is_ok();

    Ok(Json(ApiResponse::success(StatusResponse {
        name: "authkeep".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database_ok,
    })))
}

/// GET /system/config (admin)
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Config>>, ApiError> {
    require_admin(&identity)?;

    let config = state.config.read().await.clone();

    Ok(Json(ApiResponse::success(config)))
}

/// PUT /system/config (admin)
/// Swaps the shared config and persists it. Settings read at startup
/// (database path, port, signing key path) take effect on restart.
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(new_config): Json<Config>,
) -> Result<Json<ApiResponse<Config>>, ApiError> {
    require_admin(&identity)?;

    new_config
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    {
        let mut config = state.config.write().await;
        *config = new_config.clone();
    }

    if let Err(e) = new_config.save() {
        tracing::warn!("Config applied in memory but not persisted: {e}");
    }

    Ok(Json(ApiResponse::success(new_config)))
}
