//! Part marking

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::{accessible_pupil, Actor};
use crate::error::ApiResult;
use crate::progress::PartMarkOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MarkPartRequest {
    pub pupil_id: Uuid,
    pub level_number: i64,
    pub part: String,
    pub completed: bool,
}

/// PATCH /api/level-progress
pub async fn mark_level_part(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<MarkPartRequest>,
) -> ApiResult<Json<PartMarkOutcome>> {
    accessible_pupil(&state, &actor, req.pupil_id).await?;

    let outcome = state
        .progress
        .mark_part(req.pupil_id, req.level_number, &req.part, req.completed)
        .await?;

    Ok(Json(outcome))
}
