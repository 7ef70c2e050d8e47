//! Submission intake, listing and review

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use swim_common::db::{Medal, Submission, SubmissionStatus};
use swim_common::events::SwimEvent;
use uuid::Uuid;

use super::auth::{accessible_pupil, Actor};
use crate::db::submissions::{find_submission, list_submissions_for_coach, mark_submission_read as store_read_flag};
use crate::error::{ApiError, ApiResult};
use crate::progress::ReviewOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    pub pupil_id: Uuid,
    pub level_number: i64,
    pub video_url: String,
}

/// POST /api/submissions
pub async fn create_submission(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateSubmissionRequest>,
) -> ApiResult<(StatusCode, Json<Submission>)> {
    actor.require_parent()?;
    let pupil = accessible_pupil(&state, &actor, req.pupil_id).await?;

    let submission = state
        .progress
        .submit(pupil.id, req.level_number, &req.video_url)
        .await?;

    state.event_bus.emit_lossy(SwimEvent::SubmissionCreated {
        submission_id: submission.id,
        pupil_id: pupil.id,
        coach_id: pupil.coach_id,
        level_number: submission.level_number,
        timestamp: Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(submission)))
}

#[derive(Debug, Deserialize)]
pub struct SubmissionQuery {
    pub status: Option<String>,
}

/// GET /api/submissions?status=PENDING
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<SubmissionQuery>,
) -> ApiResult<Json<Vec<Submission>>> {
    actor.require_coach()?;
    let status = query
        .status
        .as_deref()
        .map(|s| s.to_uppercase().parse::<SubmissionStatus>())
        .transpose()?;

    Ok(Json(list_submissions_for_coach(&state.db, actor.user_id, status).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub feedback: String,
    pub medal: Medal,
}

/// POST /api/submissions/:id/review
pub async fn review_submission(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(submission_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<ReviewOutcome>> {
    actor.require_coach()?;

    let submission = find_submission(&state.db, submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Submission not found: {}", submission_id)))?;
    let pupil = accessible_pupil(&state, &actor, submission.pupil_id).await?;

    let outcome = state
        .progress
        .review(submission_id, &req.feedback, req.medal)
        .await?;

    state.event_bus.emit_lossy(SwimEvent::SubmissionReviewed {
        submission_id,
        pupil_id: pupil.id,
        parent_id: pupil.parent_id,
        level_number: outcome.submission.level_number,
        medal: outcome.submission.medal,
        progress: outcome.progress,
        timestamp: Utc::now(),
    });

    Ok(Json(outcome))
}

/// POST /api/submissions/:id/read
///
/// Coach has watched the video. Independent of review state.
pub async fn mark_submission_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(submission_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    actor.require_coach()?;

    let submission = find_submission(&state.db, submission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Submission not found: {}", submission_id)))?;
    accessible_pupil(&state, &actor, submission.pupil_id).await?;

    if store_read_flag(&state.db, submission_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Submission not found: {}", submission_id)))
    }
}
