//! Argon2id hashing for the access authorization code.
//!
//! The plaintext code only lives in the environment; the kernel keeps the PHC
//! string so a memory dump of the session store does not reveal it.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash an access code using Argon2id with a random salt.
///
/// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
pub fn hash_auth_code(code: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(code.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a candidate code against a stored PHC-formatted Argon2id hash.
///
/// Returns `Ok(true)` if the code matches, `Ok(false)` if it does not.
pub fn verify_auth_code(code: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(code.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_auth_code("open-sesame").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"), "expected argon2id PHC prefix");
        assert!(verify_auth_code("open-sesame", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_wrong_code_fails() {
        let hash = hash_auth_code("real-code").expect("hashing should succeed");
        assert!(!verify_auth_code("wrong-code", &hash).expect("verify should succeed"));
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_auth_code("anything", "not-a-phc-string").is_err());
    }
}
