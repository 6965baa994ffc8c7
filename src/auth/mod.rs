//! Security core: password hashing, bearer tokens, TOTP derivation, and the
//! authorization policy.

pub mod password;
pub mod policy;
pub mod token;
pub mod totp;

pub use policy::{Identity, Role};
pub use token::{Claims, TokenError, TokenService};
