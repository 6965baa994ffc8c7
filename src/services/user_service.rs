//! Domain service for administrative user management.
//!
//! Role checks live at the API edge (`auth::policy`); everything here assumes
//! the caller was already cleared as an admin.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Role;
use crate::db::{User, UserUpdate};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Username already taken")]
    Conflict,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Create-user payload.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub user_type: Role,
}

/// Domain service trait for user management.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Creates a user with a freshly hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] when the username is taken.
    async fn create_user(&self, req: CreateUser) -> Result<User, UserError>;

    async fn list_users(&self) -> Result<Vec<User>, UserError>;

    /// Applies a partial profile update.
    async fn edit_user(&self, user_id: Uuid, fields: UserUpdate) -> Result<User, UserError>;

    /// Deletes a user, cascading deletion of their TOTP secrets.
    async fn delete_user(&self, user_id: Uuid) -> Result<(), UserError>;

    /// Resets a user's password to a random one-time value and returns it.
    /// The account is flagged `must_change_password`.
    async fn reset_password(&self, user_id: Uuid) -> Result<String, UserError>;
}
