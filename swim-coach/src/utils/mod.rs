//! Utility modules for swim-coach

pub mod db_retry;

pub use db_retry::retry_on_conflict;
