//! Error taxonomy of the progress core

use thiserror::Error;
use uuid::Uuid;

pub type ProgressResult<T> = Result<T, ProgressError>;

#[derive(Debug, Error)]
pub enum ProgressError {
    /// Referenced submission, pupil or level does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Submission is no longer PENDING
    #[error("Submission {0} has already been reviewed")]
    AlreadyReviewed(Uuid),

    /// Completing this level would skip past an unlocked level
    #[error("Level {completed_level} is not unlocked for a pupil at progress {current_progress}")]
    InvalidLevelSequence {
        current_progress: i64,
        completed_level: i64,
    },

    /// Malformed request data (unknown part, empty video URL)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transient store failure or lost optimistic race; safe to retry
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store failure that retrying will not fix (constraint, decode)
    #[error("Store error: {0}")]
    Internal(String),
}

impl ProgressError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ProgressError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether retrying the whole operation from scratch may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProgressError::StoreUnavailable(_))
    }
}

/// SQLite result codes that clear up on their own: BUSY, LOCKED,
/// BUSY_RECOVERY, LOCKED_SHAREDCACHE, BUSY_SNAPSHOT
const TRANSIENT_SQLITE_CODES: &[&str] = &["5", "6", "261", "262", "517"];

fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err
                .code()
                .map(|code| TRANSIENT_SQLITE_CODES.contains(&code.as_ref()))
                .unwrap_or(false)
                || db_err.message().contains("database is locked")
        }
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => true,
        _ => false,
    }
}

impl From<sqlx::Error> for ProgressError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient(&err) {
            ProgressError::StoreUnavailable(err.to_string())
        } else {
            ProgressError::Internal(err.to_string())
        }
    }
}

impl From<swim_common::Error> for ProgressError {
    fn from(err: swim_common::Error) -> Self {
        match err {
            swim_common::Error::NotFound(what) => ProgressError::NotFound {
                entity: "record",
                id: what,
            },
            swim_common::Error::InvalidInput(msg) => ProgressError::InvalidInput(msg),
            swim_common::Error::Database(db_err) => db_err.into(),
            swim_common::Error::Io(io_err) => ProgressError::StoreUnavailable(io_err.to_string()),
            other => ProgressError::Internal(other.to_string()),
        }
    }
}
