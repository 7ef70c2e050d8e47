//! Database access for swim-coach
//!
//! Plain query functions over the shared pool, plus the SQLite
//! implementation of the progress store.

pub mod dashboard;
pub mod messages;
pub mod notifications;
pub mod progress_store;
pub mod pupils;
pub mod registrations;
pub mod sessions;
pub mod submissions;
pub mod user_settings;
pub mod users;

pub use progress_store::{SqliteProgressStore, SqliteProgressTransaction};
