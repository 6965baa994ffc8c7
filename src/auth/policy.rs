//! Authorization policy: the single place where roles are checked.
//!
//! Handlers never compare role strings themselves; they resolve the caller to
//! an [`Identity`] and call [`require_admin`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Role carried by every user. Stored as a plain string in the `users` table,
/// parsed here at the core boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    /// Parse a persisted role value. Anything unrecognized degrades to the
    /// unprivileged role.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        if value == "admin" { Self::Admin } else { Self::User }
    }
}

/// Resolved caller identity, decoded from a validated bearer token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("administrator role required")]
pub struct Forbidden;

/// Gate for administrative operations: user management and config access.
pub const fn require_admin(identity: &Identity) -> Result<(), Forbidden> {
    match identity.role {
        Role::Admin => Ok(()),
        Role::User => Err(Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn admin_passes() {
        assert_eq!(require_admin(&identity(Role::Admin)), Ok(()));
    }

    #[test]
    fn regular_user_is_forbidden() {
        assert_eq!(require_admin(&identity(Role::User)), Err(Forbidden));
    }

    #[test]
    fn unknown_role_degrades_to_user() {
        assert_eq!(Role::from_db("admin"), Role::Admin);
        assert_eq!(Role::from_db("user"), Role::User);
        assert_eq!(Role::from_db("superuser"), Role::User);
        assert_eq!(Role::from_db(""), Role::User);
    }
}
