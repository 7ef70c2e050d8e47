//! Chat between a parent and their coach
//!
//! A parent always talks to their assigned coach; a coach names the parent.
//! Posting stores the message, announces it on the event bus and notifies
//! the other party.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use swim_common::db::{Message, Role};
use swim_common::events::SwimEvent;
use uuid::Uuid;

use super::auth::Actor;
use crate::db::messages::{insert_message, list_conversation, mark_messages_read as mark_read};
use crate::db::users::find_user;
use crate::error::{ApiError, ApiResult};
use crate::notify::{dispatch_detached, Notification};
use crate::AppState;

/// Longest message body shown in a notification
const PREVIEW_CHARS: usize = 80;

/// (parent_id, coach_id) of the conversation the actor may use
async fn conversation(state: &AppState, actor: &Actor, parent_id: Option<Uuid>) -> ApiResult<(Uuid, Uuid)> {
    match actor.role {
        Role::Parent => {
            let coach_id = actor
                .coach_id
                .ok_or_else(|| ApiError::BadRequest("No coach assigned".to_string()))?;
            Ok((actor.user_id, coach_id))
        }
        Role::Coach => {
            let parent_id =
                parent_id.ok_or_else(|| ApiError::BadRequest("parent_id is required".to_string()))?;
            match find_user(&state.db, parent_id).await? {
                Some(parent) if parent.role == Role::Parent && parent.coach_id == Some(actor.user_id) => {
                    Ok((parent_id, actor.user_id))
                }
                _ => Err(ApiError::NotFound(format!("Parent not found: {}", parent_id))),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub parent_id: Option<Uuid>,
}

/// GET /api/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ConversationQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    let (parent_id, coach_id) = conversation(&state, &actor, query.parent_id).await?;
    Ok(Json(list_conversation(&state.db, parent_id, coach_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Message must not be empty".to_string()));
    }

    let (parent_id, coach_id) = conversation(&state, &actor, req.parent_id).await?;
    let message = insert_message(&state.db, parent_id, coach_id, actor.role, content).await?;

    state.event_bus.emit_lossy(SwimEvent::MessagePosted {
        message_id: message.id,
        parent_id,
        coach_id,
        sender: actor.role,
        content: message.content.clone(),
        timestamp: message.created_at,
    });

    let (recipient, deep_link) = match actor.role {
        Role::Parent => (coach_id, format!("/coach/chat?parent_id={}", parent_id)),
        Role::Coach => (parent_id, "/app/chat".to_string()),
    };
    dispatch_detached(
        state.notifier.clone(),
        Notification {
            recipient_user_id: recipient,
            title: format!("New message from {}", actor.name),
            body: preview(&message.content),
            deep_link_url: deep_link,
        },
    );

    Ok((StatusCode::CREATED, Json(message)))
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        content.to_string()
    } else {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// POST /api/messages/mark-read
///
/// Only messages addressed to the caller are affected.
pub async fn mark_messages_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<MarkReadRequest>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = mark_read(&state.db, &req.ids, actor.user_id, actor.role).await?;
    Ok(Json(MarkReadResponse { updated }))
}
