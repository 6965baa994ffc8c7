use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;
use uuid::Uuid;

use crate::auth::password;
use crate::entities::prelude::*;
use crate::entities::{totp_secrets, users};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap credentials seeded on a fresh database.
///
/// Operational requirement: change this password immediately after the first
/// login. The account carries `must_change_password` as a reminder.
const BOOTSTRAP_USERNAME: &str = "admin";
const BOOTSTRAP_PASSWORD: &str = "admin";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TotpSecrets)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Labels act as per-user selectors (default-setting, lookup).
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_totp_secrets_user_label")
                    .table(TotpSecrets)
                    .col(totp_secrets::Column::UserId)
                    .col(totp_secrets::Column::Label)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Seed the bootstrap admin with a hashed password.
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = password::hash_password(BOOTSTRAP_PASSWORD, None)
            .map_err(|e| DbErr::Custom(format!("Failed to hash bootstrap password: {e}")))?;

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Id,
                users::Column::Username,
                users::Column::Email,
                users::Column::PasswordHash,
                users::Column::UserType,
                users::Column::MustChangePassword,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                Uuid::new_v4().into(),
                BOOTSTRAP_USERNAME.into(),
                Option::<String>::None.into(),
                password_hash.into(),
                "admin".into(),
                true.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TotpSecrets).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
