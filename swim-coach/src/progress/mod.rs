//! Pupil level progress
//!
//! The advancement rule, the repository contracts with an in-memory
//! implementation, and [`ProgressService`] which runs the review, part
//! marking, intake and overview operations against any [`ProgressStore`].

pub mod error;
pub mod memory;
pub mod overview;
pub mod parts;
pub mod review;
pub mod rule;
pub mod service;
pub mod store;
pub mod submit;

pub use error::{ProgressError, ProgressResult};
pub use memory::InMemoryProgressStore;
pub use overview::{LevelOverview, LevelStatus};
pub use parts::PartMarkOutcome;
pub use review::ReviewOutcome;
pub use rule::{advance_progress, is_unlocked};
pub use service::ProgressService;
pub use store::{ProgressStore, StoreTransaction};
