//! swim-coach library - swim-school progress service
//!
//! Coaches review video submissions and award medals; parents follow their
//! child's progress through the level catalog. The progress core lives in
//! [`progress`]; [`api`] exposes it over HTTP.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use swim_common::events::EventBus;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod notify;
pub mod progress;
pub mod settings;
pub mod utils;

use db::SqliteProgressStore;
use notify::{NotificationDispatcher, StoredNotificationDispatcher};
use progress::ProgressService;
use settings::RuntimeSettings;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Review, part marking, intake and overview
    pub progress: Arc<ProgressService<SqliteProgressStore>>,
    /// Event bus feeding the SSE endpoint
    pub event_bus: Arc<EventBus>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub settings: RuntimeSettings,
}

impl AppState {
    /// Wire the production collaborators around a prepared database
    pub fn new(db: SqlitePool, settings: RuntimeSettings, app_url: &str) -> Self {
        let event_bus = Arc::new(EventBus::new(settings.event_bus_capacity));
        let notifier: Arc<dyn NotificationDispatcher> = Arc::new(StoredNotificationDispatcher::new(
            db.clone(),
            event_bus.clone(),
            app_url,
        ));
        Self::with_notifier(db, settings, event_bus, notifier)
    }

    /// State with a caller-supplied notification dispatcher
    pub fn with_notifier(
        db: SqlitePool,
        settings: RuntimeSettings,
        event_bus: Arc<EventBus>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let progress = Arc::new(ProgressService::new(
            SqliteProgressStore::new(db.clone()),
            notifier.clone(),
            settings.review_max_lock_wait_ms,
        ));
        Self {
            db,
            progress,
            event_bus,
            notifier,
            settings,
        }
    }
}

/// Build application router
///
/// `/health` and the login/registration endpoints are public; everything
/// else requires a session cookie.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    // Protected routes (require a session)
    let protected = Router::new()
        .route("/api/register/child", post(api::add_child))
        .route("/api/levels", get(api::list_levels))
        .route("/api/pupils", get(api::list_pupils))
        .route("/api/pupils/:id", patch(api::update_pupil))
        .route("/api/pupils/:id/levels", get(api::pupil_levels))
        .route(
            "/api/submissions",
            get(api::list_submissions).post(api::create_submission),
        )
        .route("/api/submissions/:id/review", post(api::review_submission))
        .route("/api/submissions/:id/read", post(api::mark_submission_read))
        .route("/api/level-progress", patch(api::mark_level_part))
        .route("/api/coach/dashboard", get(api::coach_dashboard))
        .route("/api/coach/parents", get(api::list_parents))
        .route(
            "/api/coach/parents/:id",
            get(api::get_parent).patch(api::update_parent),
        )
        .route("/api/profile", get(api::get_profile).patch(api::update_profile))
        .route("/api/settings", get(api::get_settings).patch(api::update_settings))
        .route("/api/messages", get(api::list_messages).post(api::send_message))
        .route("/api/messages/mark-read", post(api::mark_messages_read))
        .route("/api/notifications", get(api::list_notifications))
        .route("/api/notifications/:id/read", post(api::mark_notification_read))
        .route("/api/events", get(api::event_stream))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/login", post(api::login))
        .route("/api/logout", post(api::logout))
        .route("/api/register", post(api::register))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
