pub mod auth_service;
pub mod auth_service_impl;
pub mod totp_service;
pub mod totp_service_impl;
pub mod user_service;
pub mod user_service_impl;

pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;
pub use totp_service::{TotpEntry, TotpService, TotpServiceError};
pub use totp_service_impl::SeaOrmTotpService;
pub use user_service::{CreateUser, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
