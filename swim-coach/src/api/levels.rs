//! Level catalog and per-pupil overview

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use swim_common::db::Level;
use uuid::Uuid;

use super::auth::{accessible_pupil, Actor};
use crate::error::ApiResult;
use crate::progress::LevelOverview;
use crate::AppState;

/// GET /api/levels
pub async fn list_levels(State(state): State<AppState>) -> ApiResult<Json<Vec<Level>>> {
    Ok(Json(state.progress.levels().await?))
}

/// GET /api/pupils/:id/levels
pub async fn pupil_levels(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(pupil_id): Path<Uuid>,
) -> ApiResult<Json<Vec<LevelOverview>>> {
    accessible_pupil(&state, &actor, pupil_id).await?;
    Ok(Json(state.progress.level_overview(pupil_id).await?))
}
