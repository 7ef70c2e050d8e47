//! A coach's parent accounts

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use swim_common::db::{Pupil, User};
use tracing::info;
use uuid::Uuid;

use super::auth::Actor;
use crate::db::pupils::{list_pupils_for_coach, list_pupils_for_parent};
use crate::db::users::{find_parent_of_coach, list_parents_of_coach, update_profile, ProfileUpdate};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Parent account with their enrolled children
#[derive(Debug, Serialize)]
pub struct ParentDetail {
    #[serde(flatten)]
    pub parent: User,
    pub pupils: Vec<Pupil>,
}

/// GET /api/coach/parents
///
/// Ordered by parent name.
pub async fn list_parents(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<ParentDetail>>> {
    actor.require_coach()?;

    let mut by_parent: HashMap<Uuid, Vec<Pupil>> = HashMap::new();
    for pupil in list_pupils_for_coach(&state.db, actor.user_id).await? {
        by_parent.entry(pupil.parent_id).or_default().push(pupil);
    }

    let parents = list_parents_of_coach(&state.db, actor.user_id)
        .await?
        .into_iter()
        .map(|parent| ParentDetail {
            pupils: by_parent.remove(&parent.id).unwrap_or_default(),
            parent,
        })
        .collect();

    Ok(Json(parents))
}

async fn own_parent(state: &AppState, actor: &Actor, parent_id: Uuid) -> ApiResult<User> {
    find_parent_of_coach(&state.db, actor.user_id, parent_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Parent not found: {}", parent_id)))
}

/// GET /api/coach/parents/:id
pub async fn get_parent(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(parent_id): Path<Uuid>,
) -> ApiResult<Json<ParentDetail>> {
    actor.require_coach()?;
    let parent = own_parent(&state, &actor, parent_id).await?;
    let pupils = list_pupils_for_parent(&state.db, parent.id).await?;

    Ok(Json(ParentDetail { parent, pupils }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateParentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// PATCH /api/coach/parents/:id
///
/// Contact details only; a taken email is a 400.
pub async fn update_parent(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(parent_id): Path<Uuid>,
    Json(req): Json<UpdateParentRequest>,
) -> ApiResult<Json<ParentDetail>> {
    actor.require_coach()?;
    if let Some(email) = &req.email {
        if !email.contains('@') {
            return Err(ApiError::BadRequest("Invalid email address".to_string()));
        }
    }
    own_parent(&state, &actor, parent_id).await?;

    let parent = update_profile(
        &state.db,
        parent_id,
        &ProfileUpdate {
            name: req.name.as_deref(),
            email: req.email.as_deref(),
            phone: req.phone.as_deref(),
            bio: None,
        },
    )
    .await?;
    let pupils = list_pupils_for_parent(&state.db, parent.id).await?;

    info!(%parent_id, coach_id = %actor.user_id, "Parent details updated");
    Ok(Json(ParentDetail { parent, pupils }))
}
