//! Bearer token issuance and validation (HS256 JWT).
//!
//! Tokens are self-contained: no server-side session store. The signing key is
//! loaded once at startup and shared read-only across requests; losing it
//! invalidates outstanding tokens, which is acceptable for short-lived bearer
//! credentials.

use std::path::Path;

use anyhow::{Context, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::policy::{Identity, Role};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Signature mismatch, malformed token, or missing claims.
    #[error("invalid token")]
    Invalid,

    #[error("expired token")]
    Expired,
}

/// Identity claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// User id.
    pub uid: Uuid,
    pub user_type: Role,
    pub iat: i64,
    pub exp: i64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.uid,
            username: claims.sub,
            role: claims.user_type,
        }
    }
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    /// Issue a signed token for the given identity.
    pub fn issue(&self, identity: &Identity) -> Result<String, jsonwebtoken::errors::Error> {
        let now = now_secs();
        let claims = Claims {
            sub: identity.username.clone(),
            uid: identity.user_id,
            user_type: identity.role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Verify signature and expiration, returning the embedded claims.
    ///
    /// Never panics on attacker-controlled input; any decode failure maps to
    /// a typed [`TokenError`].
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}

/// Load the signing key from disk, generating and persisting a fresh one on
/// first start.
pub fn load_or_create_signing_key(path: &Path) -> Result<Vec<u8>> {
    if path.exists() {
        let key = std::fs::read(path)
            .with_context(|| format!("Failed to read signing key: {}", path.display()))?;
        anyhow::ensure!(!key.is_empty(), "Signing key file is empty: {}", path.display());
        return Ok(key);
    }

    let mut key = vec![0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rng(), &mut key);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &key)
        .with_context(|| format!("Failed to write signing key: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("Generated new token signing key: {}", path.display());
    Ok(key)
}

/// Generate an ephemeral in-memory signing key. Tokens will not survive a
/// restart; used when no key path is configured.
#[must_use]
pub fn ephemeral_signing_key() -> Vec<u8> {
    let mut key = vec![0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::rng(), &mut key);
    key
}

fn now_secs() -> i64 {
    #[allow(clippy::cast_possible_wrap)]
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    secs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            role: Role::User,
        }
    }

    fn test_service() -> TokenService {
        TokenService::new(b"test-secret-key-for-testing", 3600)
    }

    #[test]
    fn issue_and_validate_round_trips_claims() {
        let tokens = test_service();
        let identity = test_identity();

        let token = tokens.issue(&identity).unwrap();
        let claims = tokens.validate(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, identity.user_id);
        assert_eq!(claims.user_type, Role::User);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let tokens = TokenService::new(b"test-secret-key-for-testing", -120);
        let token = tokens.issue(&test_identity()).unwrap();

        assert_eq!(tokens.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_input_is_invalid_not_a_panic() {
        let tokens = test_service();

        assert_eq!(tokens.validate(""), Err(TokenError::Invalid));
        assert_eq!(tokens.validate("not-a-jwt"), Err(TokenError::Invalid));
        assert_eq!(
            tokens.validate("aaaa.bbbb.cccc\u{0}\u{1}"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn wrong_key_fails_validation() {
        let tokens = test_service();
        let other = TokenService::new(b"a-different-secret", 3600);

        let token = tokens.issue(&test_identity()).unwrap();
        assert_eq!(other.validate(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn tampered_claims_fail_validation() {
        let tokens = test_service();
        let token = tokens.issue(&test_identity()).unwrap();

        // Extending the payload segment always desyncs it from the signature.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[1].push('b');
        let tampered = parts.join(".");

        assert_eq!(tokens.validate(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn spliced_payload_fails_validation() {
        let tokens = test_service();

        let user_token = tokens.issue(&test_identity()).unwrap();
        let admin_token = tokens
            .issue(&Identity {
                user_id: Uuid::new_v4(),
                username: "mallory".to_string(),
                role: Role::Admin,
            })
            .unwrap();

        // Admin payload riding on the user token's signature.
        let user_parts: Vec<&str> = user_token.split('.').collect();
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let spliced = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

        assert_eq!(tokens.validate(&spliced), Err(TokenError::Invalid));
    }
}
