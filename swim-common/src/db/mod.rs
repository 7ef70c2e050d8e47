//! Database schema, seed data and row models

pub mod catalog;
pub mod init;
pub mod models;

pub use catalog::*;
pub use init::*;
pub use models::*;
