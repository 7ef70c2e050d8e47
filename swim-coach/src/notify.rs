//! Notification dispatch
//!
//! The progress core hands a [`Notification`] to a [`NotificationDispatcher`]
//! after a review commits. Delivery runs detached from the request and its
//! failures are only logged.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use swim_common::events::{EventBus, SwimEvent};
use uuid::Uuid;

use crate::db::notifications::insert_notification;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient_user_id: Uuid,
    pub title: String,
    pub body: String,
    /// Path inside the web app, e.g. `/app/levels/3`
    pub deep_link_url: String,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> swim_common::Result<()>;
}

/// Persists notifications and announces them on the event bus
pub struct StoredNotificationDispatcher {
    pool: SqlitePool,
    event_bus: Arc<EventBus>,
    app_url: String,
}

impl StoredNotificationDispatcher {
    pub fn new(pool: SqlitePool, event_bus: Arc<EventBus>, app_url: impl Into<String>) -> Self {
        Self {
            pool,
            event_bus,
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn absolute_url(&self, deep_link: &str) -> String {
        if deep_link.starts_with("http://") || deep_link.starts_with("https://") {
            deep_link.to_string()
        } else {
            format!("{}/{}", self.app_url, deep_link.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl NotificationDispatcher for StoredNotificationDispatcher {
    async fn dispatch(&self, notification: Notification) -> swim_common::Result<()> {
        let url = self.absolute_url(&notification.deep_link_url);
        let record = insert_notification(
            &self.pool,
            notification.recipient_user_id,
            &notification.title,
            &notification.body,
            &url,
            Utc::now(),
        )
        .await?;

        self.event_bus.emit_lossy(SwimEvent::NotificationCreated {
            notification_id: record.id,
            recipient_id: record.recipient_id,
            title: record.title,
            body: record.body,
            url: record.url,
            timestamp: record.created_at,
        });

        Ok(())
    }
}

/// Deliver in the background; failures are logged and otherwise ignored
pub fn dispatch_detached(dispatcher: Arc<dyn NotificationDispatcher>, notification: Notification) {
    tokio::spawn(async move {
        let recipient = notification.recipient_user_id;
        match dispatcher.dispatch(notification).await {
            Ok(()) => tracing::debug!(%recipient, "Notification delivered"),
            Err(e) => tracing::warn!(%recipient, error = %e, "Notification dispatch failed"),
        }
    });
}
