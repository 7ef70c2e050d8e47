//! Repository contracts of the progress core
//!
//! The orchestrator only ever talks to a [`StoreTransaction`]: one value that
//! exposes every entity repository and either commits all of its writes or,
//! when dropped, none of them. Storage engines plug in by implementing
//! [`ProgressStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use swim_common::db::{Level, LevelProgress, Medal, Pupil, Submission};
use uuid::Uuid;

use super::error::ProgressResult;

/// Read-only level catalog
#[async_trait]
pub trait CatalogRepository {
    async fn find_level(&mut self, level_number: i64) -> ProgressResult<Option<Level>>;

    /// All levels in ascending order
    async fn list_levels(&mut self) -> ProgressResult<Vec<Level>>;
}

#[async_trait]
pub trait PupilRepository {
    async fn find_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Option<Pupil>>;

    /// Compare-and-set of `Pupil.progress`
    ///
    /// Writes `new_progress` only if the stored value still equals
    /// `expected`. Returns `false` when another writer got there first.
    async fn update_progress(
        &mut self,
        pupil_id: Uuid,
        expected: i64,
        new_progress: i64,
    ) -> ProgressResult<bool>;
}

#[async_trait]
pub trait SubmissionRepository {
    async fn find_submission(&mut self, submission_id: Uuid) -> ProgressResult<Option<Submission>>;

    async fn insert_submission(&mut self, submission: &Submission) -> ProgressResult<()>;

    /// PENDING -> REVIEWED, conditional on the row still being PENDING
    ///
    /// Returns `false` (and writes nothing) when the submission was already
    /// reviewed.
    async fn mark_reviewed(
        &mut self,
        submission_id: Uuid,
        feedback: &str,
        medal: Medal,
        reviewed_at: DateTime<Utc>,
    ) -> ProgressResult<bool>;

    /// Submissions of a pupil, oldest first
    async fn submissions_for_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Vec<Submission>>;
}

#[async_trait]
pub trait LevelProgressRepository {
    /// Existing record or a fresh one with both flags false
    ///
    /// At most one record exists per (pupil, level).
    async fn get_or_create(&mut self, pupil_id: Uuid, level_number: i64) -> ProgressResult<LevelProgress>;

    async fn save_level_progress(&mut self, progress: &LevelProgress) -> ProgressResult<()>;

    /// Record one part's completion state
    async fn set_part(
        &mut self,
        pupil_id: Uuid,
        level_number: i64,
        part: &str,
        completed: bool,
        at: DateTime<Utc>,
    ) -> ProgressResult<()>;

    /// Names of the parts currently marked completed
    async fn completed_parts(&mut self, pupil_id: Uuid, level_number: i64) -> ProgressResult<Vec<String>>;

    async fn level_progress_for_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Vec<LevelProgress>>;
}

/// One atomic unit of work across all repositories
///
/// Dropping the transaction without calling [`commit`](Self::commit)
/// discards every write made through it.
#[async_trait]
pub trait StoreTransaction:
    CatalogRepository + PupilRepository + SubmissionRepository + LevelProgressRepository + Send + Sized
{
    async fn commit(self) -> ProgressResult<()>;
}

/// Storage engine that hands out transactions
#[async_trait]
pub trait ProgressStore: Send + Sync + 'static {
    type Tx: StoreTransaction;

    async fn begin(&self) -> ProgressResult<Self::Tx>;
}
