//! Argon2id hashing for stored passwords.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{UserError, UserResult};

/// Hashes `password` with a fresh random salt into a PHC string.
pub fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

/// `Ok(false)` on mismatch; errors only when `hash` is not a PHC string.
pub fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original() {
        let hash = hash_password("secret123").unwrap();
        assert_ne!(hash, "secret123");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("secret124", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_calls() {
        assert_ne!(
            hash_password("secret123").unwrap(),
            hash_password("secret123").unwrap()
        );
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(matches!(
            verify_password("secret123", "plaintext"),
            Err(UserError::PasswordHash(_))
        ));
    }
}
