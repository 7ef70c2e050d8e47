//! Pupil listing and coach edits

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use swim_common::db::{Pupil, Role};
use tracing::info;
use uuid::Uuid;

use super::auth::{accessible_pupil, Actor};
use crate::db::pupils::{list_pupils_for_coach, list_pupils_for_parent, update_pupil as store_pupil_edit};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/pupils
///
/// A parent's children or a coach's pupils.
pub async fn list_pupils(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Pupil>>> {
    let pupils = match actor.role {
        Role::Parent => list_pupils_for_parent(&state.db, actor.user_id).await?,
        Role::Coach => list_pupils_for_coach(&state.db, actor.user_id).await?,
    };
    Ok(Json(pupils))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePupilRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// PATCH /api/pupils/:id
///
/// Coach edit of name and notes. Progress is not editable here.
pub async fn update_pupil(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(pupil_id): Path<Uuid>,
    Json(req): Json<UpdatePupilRequest>,
) -> ApiResult<Json<Pupil>> {
    actor.require_coach()?;
    if req.name.is_none() && req.notes.is_none() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }
    accessible_pupil(&state, &actor, pupil_id).await?;

    let pupil = store_pupil_edit(&state.db, pupil_id, req.name.as_deref(), req.notes.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Pupil not found: {}", pupil_id)))?;

    info!(%pupil_id, coach_id = %actor.user_id, "Pupil details updated");
    Ok(Json(pupil))
}
