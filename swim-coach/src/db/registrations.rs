//! Pending registrations
//!
//! A parent who just signed up gets a short window in which they may add
//! their child. The window is a row with an expiry, so it survives restarts
//! and is shared by every instance using the same database.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use swim_common::db::Pupil;
use swim_common::Result;
use uuid::Uuid;

use super::pupils::{insert_pupil, new_pupil};

/// Open (or reopen) the registration window of a user
pub async fn open_registration(pool: &SqlitePool, user_id: Uuid, window: Duration) -> Result<DateTime<Utc>> {
    let expires_at = Utc::now() + window;

    sqlx::query(
        r#"
        INSERT INTO pending_registrations (user_id, expires_at) VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET expires_at = excluded.expires_at
        "#,
    )
    .bind(user_id.to_string())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(expires_at)
}

/// Close a live window; `false` if there was none or it has expired
///
/// Check and delete are one statement, so of several concurrent claims at
/// most one succeeds.
pub async fn claim_registration(conn: &mut SqliteConnection, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM pending_registrations WHERE user_id = ? AND expires_at > ?")
        .bind(user_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Turn a live registration window into an enrolled pupil
///
/// Claiming the window and inserting the pupil commit together. Returns
/// `None` (and writes nothing) when no live window exists.
pub async fn complete_registration(
    pool: &SqlitePool,
    name: &str,
    date_of_birth: Option<NaiveDate>,
    parent_id: Uuid,
    coach_id: Uuid,
) -> Result<Option<Pupil>> {
    let mut tx = pool.begin().await?;
    if !claim_registration(&mut tx, parent_id).await? {
        return Ok(None);
    }

    let pupil = new_pupil(name, date_of_birth, parent_id, coach_id);
    insert_pupil(&mut tx, &pupil).await?;
    tx.commit().await?;

    Ok(Some(pupil))
}

/// Drop every expired window
pub async fn purge_expired_registrations(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM pending_registrations WHERE expires_at <= ?")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::{create_user, NewUser};
    use swim_common::db::{init_memory_database, Role};

    async fn family(pool: &SqlitePool) -> (Uuid, Uuid) {
        let coach = create_user(
            pool,
            &NewUser {
                email: "coach@pool.test",
                name: "Coach",
                password: "pw",
                role: Role::Coach,
                coach_id: None,
                phone: None,
            },
        )
        .await
        .unwrap();
        let parent = create_user(
            pool,
            &NewUser {
                email: "parent@pool.test",
                name: "Parent",
                password: "pw",
                role: Role::Parent,
                coach_id: Some(coach.id),
                phone: None,
            },
        )
        .await
        .unwrap();
        (parent.id, coach.id)
    }

    async fn pupil_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM pupils").fetch_one(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_window_is_single_use() {
        let pool = init_memory_database().await.unwrap();
        let (parent_id, coach_id) = family(&pool).await;

        assert!(complete_registration(&pool, "Mia", None, parent_id, coach_id).await.unwrap().is_none());
        open_registration(&pool, parent_id, Duration::minutes(30)).await.unwrap();

        let pupil = complete_registration(&pool, "Mia", None, parent_id, coach_id).await.unwrap().unwrap();
        assert_eq!(pupil.parent_id, parent_id);
        assert_eq!(pupil.progress, 0);

        assert!(complete_registration(&pool, "Noah", None, parent_id, coach_id).await.unwrap().is_none());
        assert_eq!(pupil_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_expired_window_cannot_be_claimed() {
        let pool = init_memory_database().await.unwrap();
        let (parent_id, coach_id) = family(&pool).await;

        open_registration(&pool, parent_id, Duration::seconds(-5)).await.unwrap();
        assert!(complete_registration(&pool, "Mia", None, parent_id, coach_id).await.unwrap().is_none());
        assert_eq!(pupil_count(&pool).await, 0);

        assert_eq!(purge_expired_registrations(&pool).await.unwrap(), 1);
        assert_eq!(purge_expired_registrations(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_claims_enroll_one_pupil() {
        let dir = tempfile::tempdir().unwrap();
        let pool = swim_common::db::init_database(&dir.path().join("registrations.db")).await.unwrap();
        let (parent_id, coach_id) = family(&pool).await;
        open_registration(&pool, parent_id, Duration::minutes(30)).await.unwrap();

        let attempts = (0..8).map(|i| {
            let pool = pool.clone();
            tokio::spawn(async move {
                complete_registration(&pool, &format!("Child {}", i), None, parent_id, coach_id).await
            })
        });
        let enrolled = futures::future::join_all(attempts)
            .await
            .into_iter()
            .filter(|joined| matches!(joined, Ok(Ok(Some(_)))))
            .count();

        assert_eq!(enrolled, 1);
        assert_eq!(pupil_count(&pool).await, 1);
    }
}
