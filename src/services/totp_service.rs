//! Domain service for per-user TOTP credentials.
//!
//! Every operation is scoped by the caller's identity; a client-supplied
//! owner id is never trusted.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Identity;

#[derive(Debug, Error)]
pub enum TotpServiceError {
    #[error("TOTP secret not found")]
    NotFound,

    #[error("Label already in use")]
    Conflict,

    #[error("Secret is not valid base32")]
    InvalidSecret,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for TotpServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// TOTP entry as exposed to clients: the current code, never the secret.
#[derive(Debug, Clone, Serialize)]
pub struct TotpEntry {
    pub id: Uuid,
    pub label: String,
    pub code: String,
    pub is_default: bool,
}

/// Domain service trait for TOTP credential management.
#[async_trait]
pub trait TotpService: Send + Sync {
    /// Lists the caller's secrets with codes computed fresh at call time.
    async fn list(&self, identity: &Identity) -> Result<Vec<TotpEntry>, TotpServiceError>;

    /// Stores a new secret under a per-user-unique label.
    ///
    /// # Errors
    ///
    /// Returns [`TotpServiceError::InvalidSecret`] for non-base32 input and
    /// [`TotpServiceError::Conflict`] for a duplicate label.
    async fn add(
        &self,
        identity: &Identity,
        label: &str,
        secret: &str,
    ) -> Result<TotpEntry, TotpServiceError>;

    /// Makes the secret with the given label the caller's single default.
    async fn set_default(&self, identity: &Identity, label: &str)
    -> Result<(), TotpServiceError>;

    /// Deletes one of the caller's secrets by id.
    async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), TotpServiceError>;
}
