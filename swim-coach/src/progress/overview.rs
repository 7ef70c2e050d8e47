//! Per-level overview of one pupil

use serde::Serialize;
use swim_common::db::{Level, Medal, SubmissionStatus};
use uuid::Uuid;

use super::error::{ProgressError, ProgressResult};
use super::rule::is_unlocked;
use super::service::ProgressService;
use super::store::{
    CatalogRepository, LevelProgressRepository, ProgressStore, PupilRepository, SubmissionRepository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    Completed,
    Current,
    Locked,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelOverview {
    pub level_number: i64,
    pub title: String,
    pub parts: Vec<String>,
    pub status: LevelStatus,
    pub first_part_completed: bool,
    pub fully_completed: bool,
    /// Medal of the most recently reviewed submission, if any
    pub medal: Option<Medal>,
    pub has_pending_submission: bool,
}

impl<S: ProgressStore> ProgressService<S> {
    /// The level catalog, ascending
    pub async fn levels(&self) -> ProgressResult<Vec<Level>> {
        let mut tx = self.store.begin().await?;
        tx.list_levels().await
    }

    /// Every catalog level with its status for the pupil, ascending
    ///
    /// Levels up to `progress` are completed, `progress + 1` is current and
    /// everything above is locked.
    pub async fn level_overview(&self, pupil_id: Uuid) -> ProgressResult<Vec<LevelOverview>> {
        // Read-only: the transaction is dropped, never committed
        let mut tx = self.store.begin().await?;

        let pupil = tx
            .find_pupil(pupil_id)
            .await?
            .ok_or_else(|| ProgressError::not_found("Pupil", pupil_id))?;
        let levels = tx.list_levels().await?;
        let records = tx.level_progress_for_pupil(pupil_id).await?;
        let submissions = tx.submissions_for_pupil(pupil_id).await?;

        let overview = levels
            .into_iter()
            .map(|level| {
                let record = records.iter().find(|r| r.level_number == level.level_number);
                let fully_completed = record.map(|r| r.fully_completed).unwrap_or(false);
                let unlocked = is_unlocked(pupil.progress, level.level_number);

                let status = if !unlocked {
                    LevelStatus::Locked
                } else if level.level_number <= pupil.progress {
                    LevelStatus::Completed
                } else {
                    LevelStatus::Current
                };

                let for_level: Vec<_> = submissions
                    .iter()
                    .filter(|s| s.level_number == level.level_number)
                    .collect();
                let medal = for_level
                    .iter()
                    .filter(|s| s.status == SubmissionStatus::Reviewed)
                    .max_by_key(|s| s.reviewed_at)
                    .map(|s| s.medal);
                let has_pending_submission = for_level.iter().any(|s| s.status == SubmissionStatus::Pending);

                LevelOverview {
                    level_number: level.level_number,
                    title: level.title,
                    parts: level.parts,
                    status,
                    first_part_completed: record.map(|r| r.first_part_completed).unwrap_or(false),
                    fully_completed,
                    medal,
                    has_pending_submission,
                }
            })
            .collect();

        Ok(overview)
    }
}
