//! # SwimCoach Common Library
//!
//! Shared code for the SwimCoach service including:
//! - Database schema, catalog seed and row models
//! - Event types (SwimEvent enum) and the broadcast event bus
//! - Configuration loading and root folder resolution
//! - Password and session token helpers
//! - Server-Sent Events stream construction

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
