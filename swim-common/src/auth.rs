//! Password hashing and session token generation
//!
//! Passwords are stored as Argon2id PHC strings in the `password_hash` column
//! of the `users` table; salt and parameters travel inside the string. Session
//! tokens are random alphanumeric strings handed to the browser in the
//! `session` cookie.
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions. Session persistence and the HTTP
//! cookie handling live in the service crate.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::{Error, Result};

/// Length of generated session tokens
pub const SESSION_TOKEN_LEN: usize = 48;

/// Generate a random session token
pub fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Hash a password with a fresh random salt
///
/// Returns a PHC string (`$argon2id$v=19$...`).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Check a password attempt against a stored PHC string
///
/// A wrong password is `Ok(false)`; a stored value that is not a PHC string
/// is `Err(CorruptRecord)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| Error::CorruptRecord(format!("password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
