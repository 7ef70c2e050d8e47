//! Notification persistence

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use swim_common::db::NotificationRecord;
use swim_common::Result;
use uuid::Uuid;

/// Store a new unread notification
pub async fn insert_notification(
    pool: &SqlitePool,
    recipient_id: Uuid,
    title: &str,
    body: &str,
    url: &str,
    created_at: DateTime<Utc>,
) -> Result<NotificationRecord> {
    let record = NotificationRecord {
        id: Uuid::new_v4(),
        recipient_id,
        title: title.to_string(),
        body: body.to_string(),
        url: url.to_string(),
        read: false,
        created_at,
    };

    sqlx::query(
        r#"
        INSERT INTO notifications (id, recipient_id, title, body, url, read, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.recipient_id.to_string())
    .bind(&record.title)
    .bind(&record.body)
    .bind(&record.url)
    .bind(record.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(record)
}

/// Notifications of a user, newest first
pub async fn list_notifications(pool: &SqlitePool, recipient_id: Uuid) -> Result<Vec<NotificationRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, recipient_id, title, body, url, read, created_at
        FROM notifications
        WHERE recipient_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(recipient_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(NotificationRecord::from_row).collect()
}

/// Mark one of the user's notifications read
///
/// Returns `false` when no such notification belongs to the user.
pub async fn mark_notification_read(pool: &SqlitePool, id: Uuid, recipient_id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND recipient_id = ?")
        .bind(id.to_string())
        .bind(recipient_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
