//! HTTP API handlers for swim-coach

pub mod accounts;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod level_progress;
pub mod levels;
pub mod messages;
pub mod notifications;
pub mod parents;
pub mod profile;
pub mod pupils;
pub mod sse;
pub mod submissions;

pub use accounts::{add_child, login, logout, register};
pub use auth::{auth_middleware, Actor};
pub use dashboard::coach_dashboard;
pub use health::health_routes;
pub use level_progress::mark_level_part;
pub use levels::{list_levels, pupil_levels};
pub use messages::{list_messages, mark_messages_read, send_message};
pub use notifications::{list_notifications, mark_notification_read};
pub use parents::{get_parent, list_parents, update_parent};
pub use profile::{get_profile, get_settings, update_profile, update_settings};
pub use pupils::{list_pupils, update_pupil};
pub use sse::event_stream;
pub use submissions::{create_submission, list_submissions, mark_submission_read, review_submission};
