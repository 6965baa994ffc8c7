use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub username: String,

    pub email: Option<String>,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    /// `"admin"` or `"user"`; parsed into [`crate::auth::Role`] at the core boundary.
    pub user_type: String,

    /// Forces password rotation on first login/bootstrap.
    pub must_change_password: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::totp_secrets::Entity")]
    TotpSecrets,
}

impl Related<super::totp_secrets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TotpSecrets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
