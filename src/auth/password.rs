//! Password hashing and verification (Argon2id).
//!
//! Hashes are self-describing PHC strings: verification only needs the stored
//! hash and the candidate plaintext. Callers on the async runtime should wrap
//! these in `spawn_blocking`; Argon2 is deliberately CPU/memory expensive.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::SecurityConfig;

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the argon2 crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a candidate password against a stored hash.
///
/// Returns `false` for malformed hashes rather than erroring; stored hashes
/// are attacker-adjacent input once the database is involved.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let cfg = fast_params();
        let hash = hash_password("hunter22", Some(&cfg)).unwrap();
        assert!(verify_password("hunter22", &hash));
    }

    #[test]
    fn wrong_password_fails() {
        let cfg = fast_params();
        let hash = hash_password("hunter22", Some(&cfg)).unwrap();
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let cfg = fast_params();
        let h1 = hash_password("same-password", Some(&cfg)).unwrap();
        let h2 = hash_password("same-password", Some(&cfg)).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn malformed_hash_returns_false() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
        assert!(!verify_password("whatever", ""));
    }
}
