//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;

use crate::auth::policy::Role;
use crate::auth::{Identity, TokenError, TokenService, password};
use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, tokens: Arc<TokenService>, security: SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            security,
        }
    }

    /// Argon2 verification is CPU-bound; run it off the async runtime.
    async fn verify_blocking(password: String, hash: String) -> Result<bool, AuthError> {
        task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task panicked: {e}")))
    }

    async fn hash_blocking(&self, password: String) -> Result<String, AuthError> {
        let security = self.security.clone();
        task::spawn_blocking(move || password::hash_password(&password, Some(&security)))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some((user, password_hash)) = self
            .store
            .users()
            .get_by_username_with_password(username)
            .await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = Self::verify_blocking(password.to_string(), password_hash).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity {
            user_id: user.id,
            username: user.username,
            role: Role::from_db(&user.user_type),
        };

        let token = self
            .tokens
            .issue(&identity)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))?;

        tracing::info!("User logged in: {}", identity.username);

        Ok(LoginResult {
            token,
            token_type: "bearer".to_string(),
            must_change_password: user.must_change_password,
        })
    }

    fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        match self.tokens.validate(token) {
            Ok(claims) => Ok(Identity::from(claims)),
            Err(TokenError::Expired) => Err(AuthError::ExpiredToken),
            Err(TokenError::Invalid) => Err(AuthError::Unauthorized),
        }
    }

    async fn current_user(&self, identity: &Identity) -> Result<User, AuthError> {
        self.store
            .users()
            .get_by_id(identity.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    async fn change_password(
        &self,
        identity: &Identity,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        if old_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let Some((user, password_hash)) = self
            .store
            .users()
            .get_by_id_with_password(identity.user_id)
            .await?
        else {
            return Err(AuthError::Unauthorized);
        };

        let is_valid = Self::verify_blocking(old_password.to_string(), password_hash).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = self.hash_blocking(new_password.to_string()).await?;

        self.store
            .users()
            .update_password(user.id, new_hash, false)
            .await?;

        tracing::info!("Password changed for user: {}", user.username);

        Ok(())
    }
}
