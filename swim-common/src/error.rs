//! Error types shared by the SwimCoach crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// config.toml unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected caller input: duplicate email, unknown enum value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Argon2 could not produce a hash
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// A stored row holds a value that no longer decodes (UUID, timestamp, role)
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}
