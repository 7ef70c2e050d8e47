use std::sync::Arc;

use super::store::ProgressStore;
use crate::notify::NotificationDispatcher;

/// Progress operations over a storage engine
///
/// Stateless apart from its collaborators; share it behind an `Arc`.
pub struct ProgressService<S: ProgressStore> {
    pub(super) store: S,
    pub(super) notifier: Arc<dyn NotificationDispatcher>,
    pub(super) max_lock_wait_ms: u64,
}

impl<S: ProgressStore> ProgressService<S> {
    /// `max_lock_wait_ms` bounds how long a conflicting review is retried
    pub fn new(store: S, notifier: Arc<dyn NotificationDispatcher>, max_lock_wait_ms: u64) -> Self {
        Self {
            store,
            notifier,
            max_lock_wait_ms,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
