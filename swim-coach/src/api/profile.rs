//! Own profile and preferences of the signed-in user

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use swim_common::db::{Language, Role, Theme, User, UserSettings};
use tracing::info;

use super::auth::Actor;
use crate::db::user_settings::{get_user_settings, update_user_settings, SettingsUpdate};
use crate::db::users::{find_user, update_profile as store_profile, ProfileUpdate};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<User>> {
    let user = find_user(&state.db, actor.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", actor.user_id)))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Coaches only
    #[serde(default)]
    pub bio: Option<String>,
}

/// PATCH /api/profile
///
/// Email changes go through the coach (see the parent edit endpoint).
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    if req.bio.is_some() && actor.role != Role::Coach {
        return Err(ApiError::BadRequest("Only coaches have a bio".to_string()));
    }

    let user = store_profile(
        &state.db,
        actor.user_id,
        &ProfileUpdate {
            name: req.name.as_deref(),
            email: None,
            phone: req.phone.as_deref(),
            bio: req.bio.as_deref(),
        },
    )
    .await?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}

/// GET /api/settings
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<UserSettings>> {
    Ok(Json(get_user_settings(&state.db, actor.user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub push_notifications: Option<bool>,
    #[serde(default)]
    pub email_notifications: Option<bool>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl UpdateSettingsRequest {
    fn parse(&self) -> ApiResult<SettingsUpdate> {
        let update = SettingsUpdate {
            push_notifications: self.push_notifications,
            email_notifications: self.email_notifications,
            theme: self.theme.as_deref().map(|t| t.to_uppercase().parse::<Theme>()).transpose()?,
            language: self.language.as_deref().map(|l| l.to_lowercase().parse::<Language>()).transpose()?,
        };
        if update.is_empty() {
            return Err(ApiError::BadRequest("No valid settings to update".to_string()));
        }
        Ok(update)
    }
}

/// PATCH /api/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<UserSettings>> {
    let update = req.parse()?;
    Ok(Json(update_user_settings(&state.db, actor.user_id, update).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(theme: Option<&str>, language: Option<&str>) -> UpdateSettingsRequest {
        UpdateSettingsRequest {
            push_notifications: None,
            email_notifications: None,
            theme: theme.map(str::to_string),
            language: language.map(str::to_string),
        }
    }

    #[test]
    fn test_settings_request_parsing() {
        let update = request(Some("dark"), Some("NL")).parse().unwrap();
        assert_eq!(update.theme, Some(Theme::Dark));
        assert_eq!(update.language, Some(Language::Nl));

        assert!(request(None, None).parse().is_err());
        assert!(request(Some("sepia"), None).parse().is_err());
        assert!(request(None, Some("de")).parse().is_err());
    }
}
