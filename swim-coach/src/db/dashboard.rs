//! Coach dashboard aggregates

use serde::Serialize;
use sqlx::SqlitePool;
use swim_common::db::{Submission, SubmissionStatus};
use swim_common::Result;
use uuid::Uuid;

use super::messages::count_unread_for_coach;
use super::submissions::list_submissions_for_coach;

#[derive(Debug, Serialize)]
pub struct CoachDashboard {
    pub pupil_count: i64,
    pub pending_submission_count: usize,
    pub unread_message_count: i64,
    /// Newest first
    pub pending_submissions: Vec<Submission>,
}

pub async fn coach_dashboard(pool: &SqlitePool, coach_id: Uuid) -> Result<CoachDashboard> {
    let pupil_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pupils WHERE coach_id = ?")
        .bind(coach_id.to_string())
        .fetch_one(pool)
        .await?;

    let pending_submissions =
        list_submissions_for_coach(pool, coach_id, Some(SubmissionStatus::Pending)).await?;

    Ok(CoachDashboard {
        pupil_count,
        pending_submission_count: pending_submissions.len(),
        unread_message_count: count_unread_for_coach(pool, coach_id).await?,
        pending_submissions,
    })
}
