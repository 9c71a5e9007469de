//! Password hashing and verification using Argon2id.
//!
//! Hashing lives here so the storage layer never sees plaintext
//! passwords. Parameters follow the OWASP ASVS recommendation
//! (memory: 19 MiB, iterations: 2, parallelism: 1) with a random
//! per-hash salt and an optional server-side pepper.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;

fn argon2_instance() -> Result<Argon2<'static>, AuthError> {
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a plaintext password into PHC format.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2_instance()?
        .hash_password(input, &salt)
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(!verify_password("wrong", &hash, None).unwrap());
    }

    #[test]
    fn salt_is_randomized() {
        let h1 = hash_password("hunter2", None).unwrap();
        let h2 = hash_password("hunter2", None).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn pepper_is_applied() {
        let hash = hash_password("hunter2", Some("pepper!")).unwrap();
        assert!(verify_password("hunter2", &hash, Some("pepper!")).unwrap());
        // Without pepper should fail.
        assert!(!verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        let result = verify_password("pw", "not-a-hash", None);
        assert!(result.is_err());
    }
}
