//! Submission lookups for the HTTP layer

use sqlx::SqlitePool;
use swim_common::db::{Submission, SubmissionStatus};
use swim_common::Result;
use uuid::Uuid;

/// Submissions of a coach's pupils, newest first, optionally by status
pub async fn list_submissions_for_coach(
    pool: &SqlitePool,
    coach_id: Uuid,
    status: Option<SubmissionStatus>,
) -> Result<Vec<Submission>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.pupil_id, s.level_number, s.video_url, s.status, s.feedback,
               s.medal, s.created_at, s.reviewed_at, s.is_read
        FROM submissions s
        JOIN pupils p ON p.id = s.pupil_id
        WHERE p.coach_id = ? AND (? IS NULL OR s.status = ?)
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(coach_id.to_string())
    .bind(status.map(|s| s.as_str()))
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    rows.iter().map(Submission::from_row).collect()
}

pub async fn find_submission(pool: &SqlitePool, id: Uuid) -> Result<Option<Submission>> {
    let row = sqlx::query(
        r#"
        SELECT id, pupil_id, level_number, video_url, status, feedback, medal, created_at, reviewed_at, is_read
        FROM submissions
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(Submission::from_row).transpose()
}

/// Flag a submission as opened by the coach; `false` if it does not exist
pub async fn mark_submission_read(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE submissions SET is_read = 1 WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
