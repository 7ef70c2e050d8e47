//! Per-user preferences

use chrono::Utc;
use sqlx::SqlitePool;
use swim_common::db::{Language, Theme, UserSettings};
use swim_common::Result;
use uuid::Uuid;

/// Fields to change; `None` keeps the current value
#[derive(Debug, Default, Clone, Copy)]
pub struct SettingsUpdate {
    pub push_notifications: Option<bool>,
    pub email_notifications: Option<bool>,
    pub theme: Option<Theme>,
    pub language: Option<Language>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.push_notifications.is_none()
            && self.email_notifications.is_none()
            && self.theme.is_none()
            && self.language.is_none()
    }
}

/// Stored settings, or the defaults when the user never saved any
pub async fn get_user_settings(pool: &SqlitePool, user_id: Uuid) -> Result<UserSettings> {
    let row = sqlx::query(
        r#"
        SELECT push_notifications, email_notifications, theme, language
        FROM user_settings
        WHERE user_id = ?
        "#,
    )
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(UserSettings::from_row).transpose()?.unwrap_or_default())
}

/// Merge `update` into the stored settings and return the result
pub async fn update_user_settings(pool: &SqlitePool, user_id: Uuid, update: SettingsUpdate) -> Result<UserSettings> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query(
        "SELECT push_notifications, email_notifications, theme, language FROM user_settings WHERE user_id = ?",
    )
    .bind(user_id.to_string())
    .fetch_optional(&mut *tx)
    .await?
    .as_ref()
    .map(UserSettings::from_row)
    .transpose()?
    .unwrap_or_default();

    let merged = UserSettings {
        push_notifications: update.push_notifications.unwrap_or(current.push_notifications),
        email_notifications: update.email_notifications.unwrap_or(current.email_notifications),
        theme: update.theme.unwrap_or(current.theme),
        language: update.language.unwrap_or(current.language),
    };

    sqlx::query(
        r#"
        INSERT INTO user_settings (user_id, push_notifications, email_notifications, theme, language, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            push_notifications = excluded.push_notifications,
            email_notifications = excluded.email_notifications,
            theme = excluded.theme,
            language = excluded.language,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id.to_string())
    .bind(merged.push_notifications)
    .bind(merged.email_notifications)
    .bind(merged.theme.as_str())
    .bind(merged.language.as_str())
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(merged)
}
