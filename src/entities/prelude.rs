pub use super::totp_secrets::Entity as TotpSecrets;
pub use super::users::Entity as Users;
