pub mod prelude;

pub mod totp_secrets;
pub mod users;
