use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
mod error;
pub mod system;
pub mod totp;
mod types;
pub mod users;

pub use error::ApiError;
pub use types::*;

use crate::auth::{TokenService, token};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, SeaOrmAuthService, SeaOrmTotpService, SeaOrmUserService, TotpService, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,

    pub users: Arc<dyn UserService>,

    pub totp: Arc<dyn TotpService>,

    pub start_time: std::time::Instant,
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::new(&config.general.database_path).await?;

    // Loaded once; read-only shared state for the lifetime of the process.
    let signing_key = if config.security.token_secret_path.is_empty() {
        tracing::warn!("No token_secret_path configured; tokens will not survive a restart");
        token::ephemeral_signing_key()
    } else {
        token::load_or_create_signing_key(Path::new(&config.security.token_secret_path))?
    };

    let tokens = Arc::new(TokenService::new(
        &signing_key,
        config.security.token_ttl_minutes * 60,
    ));

    let auth = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        tokens,
        config.security.clone(),
    ));
    let users = Arc::new(SeaOrmUserService::new(
        store.clone(),
        config.security.clone(),
    ));
    let totp = Arc::new(SeaOrmTotpService::new(store.clone()));

    Ok(Arc::new(AppState {
        config: Arc::new(RwLock::new(config)),
        store,
        auth,
        users,
        totp,
        start_time: std::time::Instant::now(),
    }))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.read().await.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        .route("/totp", get(totp::list_secrets))
        .route("/totp", post(totp::add_secret))
        .route("/totp/default", put(totp::set_default))
        .route("/totp/{id}", delete(totp::delete_secret))
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}", put(users::edit_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/users/{id}/reset-password", post(users::reset_password))
        .route("/system/status", get(system::get_status))
        .route("/system/config", get(system::get_config))
        .route("/system/config", put(system::update_config))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
