//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::task;
use uuid::Uuid;

use crate::auth::password;
use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User, UserUpdate};
use crate::services::user_service::{CreateUser, UserError, UserService};

const ONE_TIME_PASSWORD_LEN: usize = 16;

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn hash_blocking(&self, plaintext: String) -> Result<String, UserError> {
        let security = self.security.clone();
        task::spawn_blocking(move || password::hash_password(&plaintext, Some(&security)))
            .await
            .map_err(|e| UserError::Internal(format!("Password hashing task panicked: {e}")))?
            .map_err(|e| UserError::Internal(e.to_string()))
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn create_user(&self, req: CreateUser) -> Result<User, UserError> {
        if req.username.trim().is_empty() {
            return Err(UserError::Validation("Username is required".to_string()));
        }
        if req.password.len() < 8 {
            return Err(UserError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        // The unique index backs this up under concurrent inserts; checking
        // first gives the common case a clean error.
        if self.store.users().get_by_username(&req.username).await?.is_some() {
            return Err(UserError::Conflict);
        }

        let password_hash = self.hash_blocking(req.password).await?;

        let user = self
            .store
            .users()
            .insert(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
                user_type: req.user_type.as_str().to_string(),
            })
            .await?;

        tracing::info!("User created: {} ({})", user.username, user.user_type);

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.users().list().await?)
    }

    async fn edit_user(&self, user_id: Uuid, fields: UserUpdate) -> Result<User, UserError> {
        if let Some(username) = &fields.username {
            if username.trim().is_empty() {
                return Err(UserError::Validation("Username cannot be empty".to_string()));
            }
            // Renaming onto an existing username is a conflict.
            if let Some(existing) = self.store.users().get_by_username(username).await?
                && existing.id != user_id
            {
                return Err(UserError::Conflict);
            }
        }

        self.store
            .users()
            .update_fields(user_id, fields)
            .await?
            .ok_or(UserError::NotFound)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), UserError> {
        let deleted = self.store.users().delete(user_id).await?;
        if !deleted {
            return Err(UserError::NotFound);
        }

        tracing::info!("User deleted: {user_id}");
        Ok(())
    }

    async fn reset_password(&self, user_id: Uuid) -> Result<String, UserError> {
        let one_time: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(ONE_TIME_PASSWORD_LEN)
            .map(char::from)
            .collect();

        let new_hash = self.hash_blocking(one_time.clone()).await?;

        let updated = self
            .store
            .users()
            .update_password(user_id, new_hash, true)
            .await?;
        if !updated {
            return Err(UserError::NotFound);
        }

        tracing::info!("Password reset for user: {user_id}");

        Ok(one_time)
    }
}
