//! `SeaORM` implementation of the `TotpService` trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::Identity;
use crate::auth::totp::{self, TotpError};
use crate::db::{Store, TotpSecret};
use crate::services::totp_service::{TotpEntry, TotpService, TotpServiceError};

pub struct SeaOrmTotpService {
    store: Store,
}

impl SeaOrmTotpService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn to_entry(row: &TotpSecret) -> Result<TotpEntry, TotpServiceError> {
        // Secrets are validated on insert, so a derivation failure here means
        // corrupted storage, not bad user input.
        let code = totp::current_code(&row.secret).map_err(|e| match e {
            TotpError::InvalidSecret => {
                TotpServiceError::Internal(format!("Stored secret {} is undecodable", row.id))
            }
            TotpError::Clock => TotpServiceError::Internal("System clock error".to_string()),
        })?;

        Ok(TotpEntry {
            id: row.id,
            label: row.label.clone(),
            code,
            is_default: row.is_default,
        })
    }
}

#[async_trait]
impl TotpService for SeaOrmTotpService {
    async fn list(&self, identity: &Identity) -> Result<Vec<TotpEntry>, TotpServiceError> {
        let rows = self.store.totp().list_for_user(identity.user_id).await?;

        rows.iter().map(Self::to_entry).collect()
    }

    async fn add(
        &self,
        identity: &Identity,
        label: &str,
        secret: &str,
    ) -> Result<TotpEntry, TotpServiceError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(TotpServiceError::Validation(
                "Label is required".to_string(),
            ));
        }

        totp::validate_secret(secret).map_err(|_| TotpServiceError::InvalidSecret)?;

        if self
            .store
            .totp()
            .get_by_label(identity.user_id, label)
            .await?
            .is_some()
        {
            return Err(TotpServiceError::Conflict);
        }

        let row = self
            .store
            .totp()
            .insert(identity.user_id, label.to_string(), secret.to_string())
            .await?;

        tracing::info!("TOTP secret added for {}: {label}", identity.username);

        Self::to_entry(&row)
    }

    async fn set_default(
        &self,
        identity: &Identity,
        label: &str,
    ) -> Result<(), TotpServiceError> {
        let switched = self
            .store
            .totp()
            .set_default(identity.user_id, label)
            .await?;

        if !switched {
            return Err(TotpServiceError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), TotpServiceError> {
        let deleted = self.store.totp().delete(id, identity.user_id).await?;
        if !deleted {
            return Err(TotpServiceError::NotFound);
        }

        Ok(())
    }
}
