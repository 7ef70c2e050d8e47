//! Review orchestration
//!
//! A review is one transaction: flip the submission to REVIEWED, complete the
//! level when a medal was awarded, advance the pupil's progress by the rule.
//! Any failure rolls everything back. The parent is told afterwards, outside
//! the transaction.

use chrono::Utc;
use serde::Serialize;
use swim_common::db::{Medal, Pupil, Submission, SubmissionStatus};
use tracing::info;
use uuid::Uuid;

use super::error::{ProgressError, ProgressResult};
use super::rule::advance_progress;
use super::service::ProgressService;
use super::store::{
    LevelProgressRepository, ProgressStore, PupilRepository, StoreTransaction, SubmissionRepository,
};
use crate::notify::{dispatch_detached, Notification};
use crate::utils::retry_on_conflict;

#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub submission: Submission,
    pub previous_progress: i64,
    pub progress: i64,
    /// The review turned the level from not-completed into fully completed
    pub level_newly_completed: bool,
}

impl<S: ProgressStore> ProgressService<S> {
    /// Apply a coach's review to a PENDING submission
    ///
    /// Transient conflicts are retried with backoff; every other error is
    /// returned as-is with nothing written.
    pub async fn review(&self, submission_id: Uuid, feedback: &str, medal: Medal) -> ProgressResult<ReviewOutcome> {
        let (outcome, pupil) = retry_on_conflict("review", self.max_lock_wait_ms, move || {
            self.review_once(submission_id, feedback, medal)
        })
        .await?;

        info!(
            %submission_id,
            pupil_id = %pupil.id,
            level = outcome.submission.level_number,
            %medal,
            previous_progress = outcome.previous_progress,
            progress = outcome.progress,
            "Submission reviewed"
        );

        dispatch_detached(self.notifier.clone(), review_notification(&pupil, &outcome));

        Ok(outcome)
    }

    async fn review_once(
        &self,
        submission_id: Uuid,
        feedback: &str,
        medal: Medal,
    ) -> ProgressResult<(ReviewOutcome, Pupil)> {
        let mut tx = self.store.begin().await?;

        let submission = tx
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| ProgressError::not_found("Submission", submission_id))?;
        if submission.status == SubmissionStatus::Reviewed {
            return Err(ProgressError::AlreadyReviewed(submission_id));
        }

        let pupil = tx
            .find_pupil(submission.pupil_id)
            .await?
            .ok_or_else(|| ProgressError::not_found("Pupil", submission.pupil_id))?;

        let now = Utc::now();
        if !tx.mark_reviewed(submission_id, feedback, medal, now).await? {
            return Err(ProgressError::AlreadyReviewed(submission_id));
        }

        let mut level_newly_completed = false;
        let mut progress = pupil.progress;
        if medal.is_awarded() {
            let mut record = tx.get_or_create(pupil.id, submission.level_number).await?;
            level_newly_completed = record.complete(now);
            if level_newly_completed {
                tx.save_level_progress(&record).await?;
            }

            progress = advance_progress(pupil.progress, submission.level_number)?;
            if progress != pupil.progress
                && !tx.update_progress(pupil.id, pupil.progress, progress).await?
            {
                return Err(ProgressError::StoreUnavailable(format!(
                    "progress of pupil {} changed concurrently",
                    pupil.id
                )));
            }
        }

        tx.commit().await?;

        let outcome = ReviewOutcome {
            submission: Submission {
                status: SubmissionStatus::Reviewed,
                feedback: Some(feedback.to_string()),
                medal,
                reviewed_at: Some(now),
                ..submission
            },
            previous_progress: pupil.progress,
            progress,
            level_newly_completed,
        };
        Ok((outcome, pupil))
    }
}

fn review_notification(pupil: &Pupil, outcome: &ReviewOutcome) -> Notification {
    let level = outcome.submission.level_number;
    let body = if outcome.submission.medal.is_awarded() {
        format!(
            "{} earned {} on level {}",
            pupil.name,
            outcome.submission.medal.as_str().to_lowercase(),
            level
        )
    } else {
        format!("The coach left feedback on {}'s level {} video", pupil.name, level)
    };

    Notification {
        recipient_user_id: pupil.parent_id,
        title: "Submission reviewed".to_string(),
        body,
        deep_link_url: format!("/app/levels/{}", level),
    }
}
