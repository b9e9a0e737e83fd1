//! Small helpers for auth validation, hashing, and client identification.

use anyhow::{Context, Result};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub(super) const OTP_SALT_LEN: usize = 16;

/// Argon2id hash of a throwaway string, verified against when the username
/// does not resolve so unknown and known accounts cost the same.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$VE0e3g7DalWHgDwou3nuRA$uC6TER156UQpk0lNQ5+jHM0l5poVjPA1he8TZebqef4";

/// Check a password against a stored argon2 PHC hash. Unparseable hashes
/// count as a mismatch rather than an error.
pub(super) fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Run a full verification against the dummy hash; the result is discarded.
pub(super) fn burn_password_verification(password: &str) {
    let _ = verify_password(DUMMY_PASSWORD_HASH, password);
}

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Uniformly random 4-digit one-time code from a cryptographically secure
/// source. Rejection sampling keeps the distribution uniform over 1000-9999.
pub(super) fn generate_otp_code() -> Result<String> {
    const RANGE: u32 = 9000;
    const LIMIT: u32 = (u32::MAX / RANGE) * RANGE;
    loop {
        let mut bytes = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut bytes)
            .context("failed to generate one-time code")?;
        let n = u32::from_be_bytes(bytes);
        if n < LIMIT {
            return Ok(format!("{}", 1000 + n % RANGE));
        }
    }
}

/// Random per-record salt for one-time code hashes. Codes are only 4 digits,
/// so an unsalted digest would be trivially reversible from a dumped table.
pub(super) fn generate_otp_salt() -> Result<[u8; OTP_SALT_LEN]> {
    let mut salt = [0u8; OTP_SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .context("failed to generate code salt")?;
    Ok(salt)
}

/// Salted digest stored in place of the plaintext one-time code.
pub(super) fn hash_otp_code(salt: &[u8], code: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(code.as_bytes());
    hasher.finalize().to_vec()
}

/// Hash a refresh-token value so raw values never touch the database.
pub(super) fn hash_refresh_token(value: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().to_vec()
}

/// Constant-time digest comparison for code and token hashes.
pub(super) fn digests_match(left: &[u8], right: &[u8]) -> bool {
    bool::from(left.ct_eq(right))
}

/// Extract a client IP for rate limiting from common proxy headers.
pub(super) fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn verify_password_round_trips_an_argon2_hash() {
        use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"hunter42", &salt)
            .expect("hashing must succeed")
            .to_string();
        assert!(verify_password(&hash, "hunter42"));
        assert!(!verify_password(&hash, "hunter43"));
    }

    #[test]
    fn verify_password_rejects_garbage_hashes() {
        assert!(!verify_password("not-a-phc-string", "hunter42"));
        assert!(!verify_password("", "hunter42"));
    }

    #[test]
    fn burn_password_verification_does_not_panic() {
        burn_password_verification("any password at all");
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Lab.EXAMPLE "), "alice@lab.example");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@lab.example"));
        assert!(valid_email("name.surname@lab.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.lab.example"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn generate_otp_code_stays_in_range() -> anyhow::Result<()> {
        for _ in 0..256 {
            let code = generate_otp_code()?;
            assert_eq!(code.len(), 4);
            let value: u32 = code.parse()?;
            assert!((1000..=9999).contains(&value));
        }
        Ok(())
    }

    #[test]
    fn hash_otp_code_depends_on_salt_and_code() -> anyhow::Result<()> {
        let salt_a = generate_otp_salt()?;
        let salt_b = generate_otp_salt()?;
        assert_ne!(salt_a, salt_b);

        let first = hash_otp_code(&salt_a, "4821");
        assert_eq!(first, hash_otp_code(&salt_a, "4821"));
        assert_ne!(first, hash_otp_code(&salt_b, "4821"));
        assert_ne!(first, hash_otp_code(&salt_a, "4822"));
        Ok(())
    }

    #[test]
    fn digests_match_is_exact() {
        let a = hash_refresh_token("token");
        let b = hash_refresh_token("token");
        let c = hash_refresh_token("other");
        assert!(digests_match(&a, &b));
        assert!(!digests_match(&a, &c));
        assert!(!digests_match(&a, &a[..16]));
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("10.0.0.5, 172.16.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("10.0.0.5".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn extract_client_ip_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
    }
}
