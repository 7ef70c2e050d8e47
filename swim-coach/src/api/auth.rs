//! Session authentication
//!
//! Protected routes resolve the `session` cookie to an [`Actor`] and insert
//! it into the request extensions. Role and ownership checks happen in the
//! handlers through the helpers below.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Duration;
use swim_common::db::{Pupil, Role};
use tracing::debug;
use uuid::Uuid;

use crate::db::pupils::find_pupil;
use crate::db::sessions::resolve_session;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Authenticated caller of a protected route
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
    /// Coach of a parent account
    pub coach_id: Option<Uuid>,
    pub session_token: String,
}

impl Actor {
    pub fn require_coach(&self) -> ApiResult<()> {
        match self.role {
            Role::Coach => Ok(()),
            Role::Parent => Err(ApiError::Forbidden("Coach access required".to_string())),
        }
    }

    pub fn require_parent(&self) -> ApiResult<()> {
        match self.role {
            Role::Parent => Ok(()),
            Role::Coach => Err(ApiError::Forbidden("Parent access required".to_string())),
        }
    }

    /// Whether the actor is the pupil's parent or coach
    pub fn can_access(&self, pupil: &Pupil) -> bool {
        match self.role {
            Role::Parent => pupil.parent_id == self.user_id,
            Role::Coach => pupil.coach_id == self.user_id,
        }
    }
}

/// Load a pupil the actor is allowed to see
///
/// Pupils of other families or coaches are reported as missing.
pub async fn accessible_pupil(state: &AppState, actor: &Actor, pupil_id: Uuid) -> ApiResult<Pupil> {
    match find_pupil(&state.db, pupil_id).await? {
        Some(pupil) if actor.can_access(&pupil) => Ok(pupil),
        _ => Err(ApiError::NotFound(format!("Pupil not found: {}", pupil_id))),
    }
}

/// Value of the session cookie, if present
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value for a session token
pub fn session_cookie(token: &str, lifetime: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        lifetime.num_seconds().max(0)
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Authentication middleware
///
/// Returns 401 when the cookie is missing, unknown or expired.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Login required".to_string()))?;

    let user = resolve_session(&state.db, &token).await?.ok_or_else(|| {
        debug!("Rejected unknown or expired session");
        ApiError::Unauthorized("Session expired".to_string())
    })?;

    request.extensions_mut().insert(Actor {
        user_id: user.id,
        role: user.role,
        name: user.name,
        coach_id: user.coach_id,
        session_token: token,
    });

    Ok(next.run(request).await)
}
