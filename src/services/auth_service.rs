//! Domain service for authentication: login, token resolution, and password
//! changes.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::auth::Identity;
use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing or invalid token")]
    Unauthorized,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub token_type: String,
    pub must_change_password: bool,
}

/// Domain service trait for authentication.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown username or a
    /// wrong password; the two cases are indistinguishable to the caller.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a bearer token into a caller identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] for malformed/mis-signed tokens
    /// and [`AuthError::ExpiredToken`] past expiration.
    fn authenticate(&self, token: &str) -> Result<Identity, AuthError>;

    /// Gets the profile behind an identity.
    async fn current_user(&self, identity: &Identity) -> Result<User, AuthError>;

    /// Changes the caller's own password after verifying the old one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the old password is
    /// wrong, [`AuthError::Validation`] when the new one is unacceptable.
    async fn change_password(
        &self,
        identity: &Identity,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
