pub mod totp;
pub mod user;
