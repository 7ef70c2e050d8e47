//! Chat message persistence

use chrono::Utc;
use sqlx::SqlitePool;
use swim_common::db::{Message, Role};
use swim_common::Result;
use uuid::Uuid;

pub async fn insert_message(
    pool: &SqlitePool,
    parent_id: Uuid,
    coach_id: Uuid,
    sender: Role,
    content: &str,
) -> Result<Message> {
    let message = Message {
        id: Uuid::new_v4(),
        parent_id,
        coach_id,
        sender,
        content: content.to_string(),
        read: false,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO messages (id, parent_id, coach_id, sender, content, read, created_at)
        VALUES (?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(message.id.to_string())
    .bind(message.parent_id.to_string())
    .bind(message.coach_id.to_string())
    .bind(message.sender.as_str())
    .bind(&message.content)
    .bind(message.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(message)
}

/// Conversation between a parent and a coach, oldest first
pub async fn list_conversation(pool: &SqlitePool, parent_id: Uuid, coach_id: Uuid) -> Result<Vec<Message>> {
    let rows = sqlx::query(
        r#"
        SELECT id, parent_id, coach_id, sender, content, read, created_at
        FROM messages
        WHERE parent_id = ? AND coach_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(parent_id.to_string())
    .bind(coach_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(Message::from_row).collect()
}

/// Mark messages read on behalf of `reader`
///
/// Only messages addressed to the reader (sent by the other party of one of
/// the reader's conversations) are touched. Returns the number updated.
pub async fn mark_messages_read(pool: &SqlitePool, ids: &[Uuid], reader_id: Uuid, reader_role: Role) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let (query, other_sender) = match reader_role {
        Role::Parent => (
            "UPDATE messages SET read = 1 WHERE id = ? AND parent_id = ? AND sender = ?",
            Role::Coach,
        ),
        Role::Coach => (
            "UPDATE messages SET read = 1 WHERE id = ? AND coach_id = ? AND sender = ?",
            Role::Parent,
        ),
    };

    let mut tx = pool.begin().await?;
    let mut updated = 0;
    for id in ids {
        updated += sqlx::query(query)
            .bind(id.to_string())
            .bind(reader_id.to_string())
            .bind(other_sender.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;

    Ok(updated)
}

/// Unread messages addressed to a coach
pub async fn count_unread_for_coach(pool: &SqlitePool, coach_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM messages WHERE coach_id = ? AND sender = 'PARENT' AND read = 0",
    )
    .bind(coach_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count)
}
