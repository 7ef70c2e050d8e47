//! Login, logout and parent registration

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use swim_common::auth::verify_password;
use swim_common::db::{Pupil, Role, User};
use tracing::{info, warn};

use super::auth::{clear_session_cookie, session_cookie, session_token, Actor};
use crate::db::registrations::{complete_registration, open_registration};
use crate::db::sessions::{create_session, delete_session, extend_session};
use crate::db::users::{coach_with_fewest_pupils, create_user, find_user_by_email, NewUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = match find_user_by_email(&state.db, &req.email).await? {
        Some(user) if verify_password(&req.password, &user.password_hash)? => user,
        _ => {
            warn!("Failed login attempt");
            return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
        }
    };

    let lifetime = state.settings.session_lifetime();
    let token = create_session(&state.db, user.id, lifetime).await?;
    info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token, lifetime))]),
        Json(user),
    ))
}

/// POST /api/logout
///
/// Always succeeds; an unknown session is simply cleared client-side.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    if let Some(token) = session_token(&headers) {
        delete_session(&state.db, &token).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub confirm_email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl RegisterRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::BadRequest("Name, email and password are required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ApiError::BadRequest("Invalid email address".to_string()));
        }
        if self.email.trim().to_lowercase() != self.confirm_email.trim().to_lowercase() {
            return Err(ApiError::BadRequest("Emails do not match".to_string()));
        }
        if self.password != self.confirm_password {
            return Err(ApiError::BadRequest("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

/// POST /api/register
///
/// Creates a parent account assigned to the least busy coach. The returned
/// session only lasts for the registration window; adding a child upgrades it.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let coach = coach_with_fewest_pupils(&state.db)
        .await?
        .ok_or_else(|| ApiError::ServiceUnavailable("No coaches available. Please try again later.".to_string()))?;

    let phone = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let user: User = create_user(
        &state.db,
        &NewUser {
            email: &req.email,
            name: &req.name,
            password: &req.password,
            role: Role::Parent,
            coach_id: Some(coach.id),
            phone,
        },
    )
    .await?;

    let window = state.settings.registration_window();
    open_registration(&state.db, user.id, window).await?;
    let token = create_session(&state.db, user.id, window).await?;

    info!(user_id = %user.id, coach_id = %coach.id, "Parent registered");

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token, window))]),
        Json(user),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AddChildRequest {
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// POST /api/register/child
///
/// Second registration step. Requires a live registration window, which it
/// consumes together with creating the pupil, and extends the session to the
/// full lifetime.
pub async fn add_child(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<AddChildRequest>,
) -> ApiResult<impl IntoResponse> {
    actor.require_parent()?;
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Child name is required".to_string()));
    }
    let coach_id = actor
        .coach_id
        .ok_or_else(|| ApiError::Internal(format!("Parent {} has no coach", actor.user_id)))?;

    let pupil: Pupil = complete_registration(&state.db, &req.name, req.date_of_birth, actor.user_id, coach_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("No pending registration".to_string()))?;

    let lifetime = state.settings.session_lifetime();
    extend_session(&state.db, &actor.session_token, lifetime).await?;

    info!(pupil_id = %pupil.id, parent_id = %actor.user_id, "Pupil enrolled");

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, session_cookie(&actor.session_token, lifetime))]),
        Json(pupil),
    ))
}
