//! Pupil persistence outside the progress core
//!
//! `progress` is never written here after enrollment; only the review flow
//! moves it.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use swim_common::db::Pupil;
use swim_common::{Error, Result};
use uuid::Uuid;

const PUPIL_COLUMNS: &str = "id, name, date_of_birth, parent_id, coach_id, progress, notes, created_at";

/// Enroll a pupil at progress 0
pub async fn create_pupil(
    pool: &SqlitePool,
    name: &str,
    date_of_birth: Option<NaiveDate>,
    parent_id: Uuid,
    coach_id: Uuid,
) -> Result<Pupil> {
    let pupil = new_pupil(name, date_of_birth, parent_id, coach_id);
    let mut conn = pool.acquire().await?;
    insert_pupil(&mut conn, &pupil).await?;

    Ok(pupil)
}

pub(crate) fn new_pupil(name: &str, date_of_birth: Option<NaiveDate>, parent_id: Uuid, coach_id: Uuid) -> Pupil {
    Pupil {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        date_of_birth,
        parent_id,
        coach_id,
        progress: 0,
        notes: String::new(),
        created_at: Utc::now(),
    }
}

/// Insert on a caller-owned connection so enrollment can share a transaction
pub(crate) async fn insert_pupil(conn: &mut SqliteConnection, pupil: &Pupil) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pupils (id, name, date_of_birth, parent_id, coach_id, progress, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(pupil.id.to_string())
    .bind(&pupil.name)
    .bind(pupil.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(pupil.parent_id.to_string())
    .bind(pupil.coach_id.to_string())
    .bind(pupil.progress)
    .bind(&pupil.notes)
    .bind(pupil.created_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Coach edit of a pupil's name and notes
///
/// `None` keeps the stored value. Returns `None` when the pupil does not exist.
pub async fn update_pupil(
    pool: &SqlitePool,
    id: Uuid,
    name: Option<&str>,
    notes: Option<&str>,
) -> Result<Option<Pupil>> {
    let name = name.map(str::trim);
    if name == Some("") {
        return Err(Error::InvalidInput("Pupil name must not be empty".to_string()));
    }

    let result = sqlx::query(
        "UPDATE pupils SET name = COALESCE(?, name), notes = COALESCE(?, notes) WHERE id = ?",
    )
    .bind(name)
    .bind(notes.map(str::trim))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_pupil(pool, id).await
}

pub async fn find_pupil(pool: &SqlitePool, id: Uuid) -> Result<Option<Pupil>> {
    let row = sqlx::query(&format!("SELECT {} FROM pupils WHERE id = ?", PUPIL_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(Pupil::from_row).transpose()
}

pub async fn list_pupils_for_parent(pool: &SqlitePool, parent_id: Uuid) -> Result<Vec<Pupil>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM pupils WHERE parent_id = ? ORDER BY created_at",
        PUPIL_COLUMNS
    ))
    .bind(parent_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(Pupil::from_row).collect()
}

pub async fn list_pupils_for_coach(pool: &SqlitePool, coach_id: Uuid) -> Result<Vec<Pupil>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM pupils WHERE coach_id = ? ORDER BY name",
        PUPIL_COLUMNS
    ))
    .bind(coach_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(Pupil::from_row).collect()
}
