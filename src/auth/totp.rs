//! TOTP code derivation (RFC 6238: SHA-1, 6 digits, 30-second step).
//!
//! Pure functions over a base32 shared secret; the only state read is the
//! wall clock. Validation tolerates ±1 step of clock drift. Validation is
//! exposed for a login-with-2FA extension even though the current API only
//! displays codes.

use thiserror::Error;
use totp_rs::{Algorithm, Secret, TOTP};

pub const STEP_SECONDS: u64 = 30;
pub const DIGITS: usize = 6;

/// Accepted clock drift when validating submitted codes, in steps.
const SKEW: u8 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotpError {
    #[error("secret is not valid base32")]
    InvalidSecret,

    #[error("system clock is before the unix epoch")]
    Clock,
}

fn build(secret_base32: &str) -> Result<TOTP, TotpError> {
    // Authenticator apps commonly display secrets grouped with spaces and in
    // lowercase; normalize before decoding.
    let normalized: String = secret_base32
        .trim()
        .trim_end_matches('=')
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(TotpError::InvalidSecret);
    }

    let secret = Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|_| TotpError::InvalidSecret)?;

    // `new_unchecked` skips the RFC 4226 minimum-length check: plenty of
    // real-world enrollment secrets are 80 bits and must keep working.
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECONDS,
        secret,
    ))
}

/// Check that a secret decodes as base32 without deriving a code.
pub fn validate_secret(secret_base32: &str) -> Result<(), TotpError> {
    build(secret_base32).map(|_| ())
}

/// Derive the code for the current 30-second step.
pub fn current_code(secret_base32: &str) -> Result<String, TotpError> {
    let totp = build(secret_base32)?;
    totp.generate_current().map_err(|_| TotpError::Clock)
}

/// Derive the code for an explicit unix timestamp.
pub fn code_at(secret_base32: &str, unix_time: u64) -> Result<String, TotpError> {
    Ok(build(secret_base32)?.generate(unix_time))
}

/// Validate a submitted code against the current step, ±1 step of drift.
pub fn verify_code(secret_base32: &str, candidate: &str) -> Result<bool, TotpError> {
    let totp = build(secret_base32)?;
    totp.check_current(candidate).map_err(|_| TotpError::Clock)
}

/// Validate a submitted code at an explicit unix timestamp, ±1 step of drift.
pub fn verify_at(secret_base32: &str, candidate: &str, unix_time: u64) -> Result<bool, TotpError> {
    Ok(build(secret_base32)?.check(candidate, unix_time))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// RFC 6238 test secret: ASCII "12345678901234567890" in base32.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn matches_rfc6238_vectors() {
        // 6-digit truncations of the RFC 6238 SHA-1 vectors.
        assert_eq!(code_at(RFC_SECRET, 59).unwrap(), "287082");
        assert_eq!(code_at(RFC_SECRET, 1_111_111_109).unwrap(), "081804");
        assert_eq!(code_at(RFC_SECRET, 1_234_567_890).unwrap(), "005924");
    }

    #[test]
    fn stable_within_a_step_changes_across_boundary() {
        let start = 1_111_111_110; // step-aligned
        let same_step = code_at(RFC_SECRET, start).unwrap();
        assert_eq!(code_at(RFC_SECRET, start + 29).unwrap(), same_step);
        assert_ne!(code_at(RFC_SECRET, start + 30).unwrap(), same_step);
    }

    #[test]
    fn codes_are_six_zero_padded_digits() {
        let code = code_at(RFC_SECRET, 1_234_567_890).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn verify_tolerates_one_step_of_drift() {
        let t = 1_111_111_110;
        let code = code_at(RFC_SECRET, t).unwrap();

        assert!(verify_at(RFC_SECRET, &code, t).unwrap());
        assert!(verify_at(RFC_SECRET, &code, t + 30).unwrap());
        assert!(verify_at(RFC_SECRET, &code, t.saturating_sub(30)).unwrap());
        assert!(!verify_at(RFC_SECRET, &code, t + 90).unwrap());
    }

    #[test]
    fn secrets_are_normalized_before_decoding() {
        let spaced = "gezd gnbv gy3t qojq gezd gnbv gy3t qojq";
        assert_eq!(code_at(spaced, 59).unwrap(), "287082");
    }

    #[test]
    fn bad_secrets_are_rejected() {
        assert_eq!(validate_secret(""), Err(TotpError::InvalidSecret));
        assert_eq!(validate_secret("   "), Err(TotpError::InvalidSecret));
        assert_eq!(validate_secret("not base32 at all!!"), Err(TotpError::InvalidSecret));
        assert_eq!(validate_secret("18918"), Err(TotpError::InvalidSecret));
    }
}
