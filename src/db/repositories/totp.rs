use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::totp_secrets;

pub struct TotpRepository {
    conn: DatabaseConnection,
}

impl TotpRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All secrets owned by one user. Every query in this repository is
    /// scoped by `user_id`; ownership is never taken from client input.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<totp_secrets::Model>> {
        let rows = totp_secrets::Entity::find()
            .filter(totp_secrets::Column::UserId.eq(user_id))
            .order_by_asc(totp_secrets::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list TOTP secrets")?;

        Ok(rows)
    }

    pub async fn get_by_label(
        &self,
        user_id: Uuid,
        label: &str,
    ) -> Result<Option<totp_secrets::Model>> {
        let row = totp_secrets::Entity::find()
            .filter(totp_secrets::Column::UserId.eq(user_id))
            .filter(totp_secrets::Column::Label.eq(label))
            .one(&self.conn)
            .await
            .context("Failed to query TOTP secret by label")?;

        Ok(row)
    }

    pub async fn insert(
        &self,
        user_id: Uuid,
        label: String,
        secret: String,
    ) -> Result<totp_secrets::Model> {
        let active = totp_secrets::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            secret: Set(secret),
            label: Set(label),
            is_default: Set(false),
            created_at: Set(Utc::now().to_rfc3339()),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert TOTP secret")?;

        Ok(model)
    }

    /// Switch the default flag to the secret with the given label.
    ///
    /// The clear-all-then-set-one sequence runs inside a single transaction:
    /// two concurrent switches must not leave zero or two defaults behind.
    /// Returns `false` when no secret with that label exists for the user.
    pub async fn set_default(&self, user_id: Uuid, label: &str) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let Some(target) = totp_secrets::Entity::find()
            .filter(totp_secrets::Column::UserId.eq(user_id))
            .filter(totp_secrets::Column::Label.eq(label))
            .one(&txn)
            .await
            .context("Failed to query TOTP secret for default switch")?
        else {
            txn.rollback().await?;
            return Ok(false);
        };

        totp_secrets::Entity::update_many()
            .col_expr(totp_secrets::Column::IsDefault, Expr::value(false))
            .filter(totp_secrets::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .context("Failed to clear default flags")?;

        totp_secrets::Entity::update_many()
            .col_expr(totp_secrets::Column::IsDefault, Expr::value(true))
            .filter(totp_secrets::Column::Id.eq(target.id))
            .exec(&txn)
            .await
            .context("Failed to set default flag")?;

        txn.commit().await?;
        Ok(true)
    }

    /// Delete by id, scoped by owner so one user can never delete another
    /// user's secret. Returns `false` when nothing matched.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = totp_secrets::Entity::delete_many()
            .filter(totp_secrets::Column::Id.eq(id))
            .filter(totp_secrets::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete TOTP secret")?;

        Ok(result.rows_affected > 0)
    }
}
