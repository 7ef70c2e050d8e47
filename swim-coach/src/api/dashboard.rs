//! Coach dashboard

use axum::{extract::State, Extension, Json};

use super::auth::Actor;
use crate::db::dashboard::{coach_dashboard as load_dashboard, CoachDashboard};
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/coach/dashboard
pub async fn coach_dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<CoachDashboard>> {
    actor.require_coach()?;
    Ok(Json(load_dashboard(&state.db, actor.user_id).await?))
}
