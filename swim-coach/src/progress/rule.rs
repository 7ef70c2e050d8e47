//! Progress advancement rule
//!
//! A pupil's `progress` is the highest fully-completed level number. Only the
//! level directly after it is unlocked. Completing that level advances
//! progress by one; re-completing an earlier level changes nothing; anything
//! further ahead is an integrity violation and is rejected, never clamped.

use super::error::{ProgressError, ProgressResult};

/// Decide a pupil's progress after `completed_level` was fully completed
pub fn advance_progress(current_progress: i64, completed_level: i64) -> ProgressResult<i64> {
    let invalid = || ProgressError::InvalidLevelSequence {
        current_progress,
        completed_level,
    };

    if current_progress < 0 || completed_level < 1 {
        return Err(invalid());
    }

    match current_progress.checked_add(1) {
        Some(next) if completed_level == next => Ok(completed_level),
        _ if completed_level <= current_progress => Ok(current_progress),
        _ => Err(invalid()),
    }
}

/// Whether `level_number` is unlocked for a pupil at `progress`
pub fn is_unlocked(progress: i64, level_number: i64) -> bool {
    level_number >= 1 && level_number <= progress.saturating_add(1)
}
