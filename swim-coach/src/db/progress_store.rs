//! SQLite implementation of the progress repositories
//!
//! Each `SqliteProgressTransaction` wraps one sqlx transaction; dropping it
//! rolls back. Writes that race with other reviewers are compare-and-set
//! (`WHERE status = 'PENDING'`, `WHERE progress = ?`) and report whether they
//! applied instead of overwriting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;
use swim_common::db::{Level, LevelProgress, Medal, Pupil, Submission};
use uuid::Uuid;

use crate::progress::store::{
    CatalogRepository, LevelProgressRepository, ProgressStore, PupilRepository, StoreTransaction,
    SubmissionRepository,
};
use crate::progress::ProgressResult;

#[derive(Clone)]
pub struct SqliteProgressStore {
    pool: SqlitePool,
}

impl SqliteProgressStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    type Tx = SqliteProgressTransaction;

    async fn begin(&self) -> ProgressResult<SqliteProgressTransaction> {
        Ok(SqliteProgressTransaction {
            tx: self.pool.begin().await?,
        })
    }
}

pub struct SqliteProgressTransaction {
    tx: Transaction<'static, Sqlite>,
}

/// Group `(level_number, title, part)` rows, already sorted by level and
/// part ordinal, into catalog levels
fn levels_from_rows(rows: &[SqliteRow]) -> ProgressResult<Vec<Level>> {
    let mut levels: BTreeMap<i64, Level> = BTreeMap::new();
    for row in rows {
        let level_number: i64 = row.try_get("level_number")?;
        let part: Option<String> = row.try_get("part")?;
        let title: String = row.try_get("title")?;
        let level = levels.entry(level_number).or_insert_with(|| Level {
            level_number,
            title,
            parts: Vec::new(),
        });
        if let Some(part) = part {
            level.parts.push(part);
        }
    }
    Ok(levels.into_values().collect())
}

#[async_trait]
impl CatalogRepository for SqliteProgressTransaction {
    async fn find_level(&mut self, level_number: i64) -> ProgressResult<Option<Level>> {
        let rows = sqlx::query(
            r#"
            SELECT l.level_number, l.title, p.part
            FROM levels l
            LEFT JOIN level_parts p ON p.level_number = l.level_number
            WHERE l.level_number = ?
            ORDER BY p.ordinal
            "#,
        )
        .bind(level_number)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(levels_from_rows(&rows)?.into_iter().next())
    }

    async fn list_levels(&mut self) -> ProgressResult<Vec<Level>> {
        let rows = sqlx::query(
            r#"
            SELECT l.level_number, l.title, p.part
            FROM levels l
            LEFT JOIN level_parts p ON p.level_number = l.level_number
            ORDER BY l.level_number, p.ordinal
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        levels_from_rows(&rows)
    }
}

#[async_trait]
impl PupilRepository for SqliteProgressTransaction {
    async fn find_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Option<Pupil>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, date_of_birth, parent_id, coach_id, progress, notes, created_at
            FROM pupils
            WHERE id = ?
            "#,
        )
        .bind(pupil_id.to_string())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(Pupil::from_row).transpose()?)
    }

    async fn update_progress(
        &mut self,
        pupil_id: Uuid,
        expected: i64,
        new_progress: i64,
    ) -> ProgressResult<bool> {
        let result = sqlx::query("UPDATE pupils SET progress = ? WHERE id = ? AND progress = ?")
            .bind(new_progress)
            .bind(pupil_id.to_string())
            .bind(expected)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl SubmissionRepository for SqliteProgressTransaction {
    async fn find_submission(&mut self, submission_id: Uuid) -> ProgressResult<Option<Submission>> {
        let row = sqlx::query(
            r#"
            SELECT id, pupil_id, level_number, video_url, status, feedback, medal, created_at, reviewed_at, is_read
            FROM submissions
            WHERE id = ?
            "#,
        )
        .bind(submission_id.to_string())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(Submission::from_row).transpose()?)
    }

    async fn insert_submission(&mut self, submission: &Submission) -> ProgressResult<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, pupil_id, level_number, video_url, status, feedback, medal, created_at, reviewed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(submission.id.to_string())
        .bind(submission.pupil_id.to_string())
        .bind(submission.level_number)
        .bind(&submission.video_url)
        .bind(submission.status.as_str())
        .bind(&submission.feedback)
        .bind(submission.medal.as_str())
        .bind(submission.created_at.to_rfc3339())
        .bind(submission.reviewed_at.map(|t| t.to_rfc3339()))
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn mark_reviewed(
        &mut self,
        submission_id: Uuid,
        feedback: &str,
        medal: Medal,
        reviewed_at: DateTime<Utc>,
    ) -> ProgressResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = 'REVIEWED', feedback = ?, medal = ?, reviewed_at = ?
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(feedback)
        .bind(medal.as_str())
        .bind(reviewed_at.to_rfc3339())
        .bind(submission_id.to_string())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn submissions_for_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Vec<Submission>> {
        let rows = sqlx::query(
            r#"
            SELECT id, pupil_id, level_number, video_url, status, feedback, medal, created_at, reviewed_at, is_read
            FROM submissions
            WHERE pupil_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(pupil_id.to_string())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .iter()
            .map(Submission::from_row)
            .collect::<swim_common::Result<Vec<_>>>()?)
    }
}

#[async_trait]
impl LevelProgressRepository for SqliteProgressTransaction {
    async fn get_or_create(&mut self, pupil_id: Uuid, level_number: i64) -> ProgressResult<LevelProgress> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO level_progress (pupil_id, level_number, first_part_completed, fully_completed)
            VALUES (?, ?, 0, 0)
            "#,
        )
        .bind(pupil_id.to_string())
        .bind(level_number)
        .execute(&mut *self.tx)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT pupil_id, level_number, first_part_completed, fully_completed, completed_at
            FROM level_progress
            WHERE pupil_id = ? AND level_number = ?
            "#,
        )
        .bind(pupil_id.to_string())
        .bind(level_number)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(LevelProgress::from_row(&row)?)
    }

    async fn save_level_progress(&mut self, progress: &LevelProgress) -> ProgressResult<()> {
        sqlx::query(
            r#"
            INSERT INTO level_progress (pupil_id, level_number, first_part_completed, fully_completed, completed_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(pupil_id, level_number) DO UPDATE SET
                first_part_completed = excluded.first_part_completed,
                fully_completed = excluded.fully_completed,
                completed_at = excluded.completed_at
            "#,
        )
        .bind(progress.pupil_id.to_string())
        .bind(progress.level_number)
        .bind(progress.first_part_completed)
        .bind(progress.fully_completed)
        .bind(progress.completed_at.map(|t| t.to_rfc3339()))
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn set_part(
        &mut self,
        pupil_id: Uuid,
        level_number: i64,
        part: &str,
        completed: bool,
        at: DateTime<Utc>,
    ) -> ProgressResult<()> {
        // A part keeps the time it was first completed until it is unmarked
        sqlx::query(
            r#"
            INSERT INTO level_part_progress (pupil_id, level_number, part, completed, completed_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(pupil_id, level_number, part) DO UPDATE SET
                completed = excluded.completed,
                completed_at = CASE
                    WHEN excluded.completed = 1 THEN COALESCE(level_part_progress.completed_at, excluded.completed_at)
                    ELSE NULL
                END
            "#,
        )
        .bind(pupil_id.to_string())
        .bind(level_number)
        .bind(part)
        .bind(completed)
        .bind(completed.then(|| at.to_rfc3339()))
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn completed_parts(&mut self, pupil_id: Uuid, level_number: i64) -> ProgressResult<Vec<String>> {
        let parts: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT part FROM level_part_progress
            WHERE pupil_id = ? AND level_number = ? AND completed = 1
            "#,
        )
        .bind(pupil_id.to_string())
        .bind(level_number)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(parts)
    }

    async fn level_progress_for_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Vec<LevelProgress>> {
        let rows = sqlx::query(
            r#"
            SELECT pupil_id, level_number, first_part_completed, fully_completed, completed_at
            FROM level_progress
            WHERE pupil_id = ?
            ORDER BY level_number
            "#,
        )
        .bind(pupil_id.to_string())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .iter()
            .map(LevelProgress::from_row)
            .collect::<swim_common::Result<Vec<_>>>()?)
    }
}

#[async_trait]
impl StoreTransaction for SqliteProgressTransaction {
    async fn commit(self) -> ProgressResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
