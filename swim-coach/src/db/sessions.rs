//! Login sessions
//!
//! A session is an opaque random token mapped to a user with an expiry.
//! Expired sessions are deleted when they are looked up.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use swim_common::auth::generate_session_token;
use swim_common::db::{parse_timestamp, parse_uuid, User};
use swim_common::Result;
use tracing::debug;
use uuid::Uuid;

use super::users::find_user;

/// Create a session for `user_id` valid for `lifetime`
pub async fn create_session(pool: &SqlitePool, user_id: Uuid, lifetime: Duration) -> Result<String> {
    let token = generate_session_token();
    let expires_at = Utc::now() + lifetime;

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id.to_string())
        .bind(expires_at.to_rfc3339())
        .execute(pool)
        .await?;

    Ok(token)
}

/// User owning a live session
pub async fn resolve_session(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let expires_at: DateTime<Utc> = parse_timestamp(&row.try_get::<String, _>("expires_at")?)?;
    if expires_at <= Utc::now() {
        debug!("Session expired at {}, deleting", expires_at);
        delete_session(pool, token).await?;
        return Ok(None);
    }

    let user_id = parse_uuid(&row.try_get::<String, _>("user_id")?)?;
    find_user(pool, user_id).await
}

/// Move a session's expiry to `lifetime` from now
pub async fn extend_session(pool: &SqlitePool, token: &str, lifetime: Duration) -> Result<()> {
    sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
        .bind((Utc::now() + lifetime).to_rfc3339())
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}
