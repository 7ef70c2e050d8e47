//! Stored notifications of the caller

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use swim_common::db::NotificationRecord;
use uuid::Uuid;

use super::auth::Actor;
use crate::db::notifications::{list_notifications as load_notifications, mark_notification_read as mark_read};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<NotificationRecord>>> {
    Ok(Json(load_notifications(&state.db, actor.user_id).await?))
}

/// POST /api/notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if mark_read(&state.db, id, actor.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Notification not found: {}", id)))
    }
}
