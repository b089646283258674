//! Password hashing using Argon2id
//!
//! One-way hashing for stored credentials. Hashes are PHC strings with
//! a per-call random salt, so the same password never hashes twice to
//! the same value.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::shared::AppError;

/// Hash a raw password using Argon2id with a freshly generated salt.
///
/// Returns the hash in PHC string format. The raw password is never
/// logged or stored.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Internal)
}

/// Verify a raw password against a stored hash.
///
/// A malformed hash and a wrong password both surface as `false`; the
/// caller learns nothing beyond the boolean. The comparison itself is
/// the argon2 verifier's constant-time check.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}
