//! Submission intake

use swim_common::db::Submission;
use tracing::info;
use uuid::Uuid;

use super::error::{ProgressError, ProgressResult};
use super::service::ProgressService;
use super::store::{CatalogRepository, ProgressStore, PupilRepository, StoreTransaction, SubmissionRepository};
use crate::utils::retry_on_conflict;

impl<S: ProgressStore> ProgressService<S> {
    /// Record a parent's video for a level as a PENDING submission
    ///
    /// Locked levels are accepted; the review decides what the video counts for.
    pub async fn submit(&self, pupil_id: Uuid, level_number: i64, video_url: &str) -> ProgressResult<Submission> {
        let video_url = video_url.trim();
        if video_url.is_empty() {
            return Err(ProgressError::InvalidInput("video_url must not be empty".to_string()));
        }

        retry_on_conflict("submit", self.max_lock_wait_ms, move || {
            self.submit_once(pupil_id, level_number, video_url)
        })
        .await
    }

    async fn submit_once(&self, pupil_id: Uuid, level_number: i64, video_url: &str) -> ProgressResult<Submission> {
        let mut tx = self.store.begin().await?;
        if tx.find_pupil(pupil_id).await?.is_none() {
            return Err(ProgressError::not_found("Pupil", pupil_id));
        }
        if tx.find_level(level_number).await?.is_none() {
            return Err(ProgressError::not_found("Level", level_number));
        }

        let submission = Submission::new_pending(pupil_id, level_number, video_url);
        tx.insert_submission(&submission).await?;
        tx.commit().await?;

        info!(submission_id = %submission.id, %pupil_id, level = level_number, "Submission received");
        Ok(submission)
    }
}
