//! In-memory progress store
//!
//! Keeps all state behind one async mutex. A transaction owns the lock for
//! its whole lifetime and works on a private copy of the state; `commit`
//! publishes the copy, dropping the transaction throws it away. Transactions
//! are therefore fully serialized, which also rules out lost updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use swim_common::db::{default_levels, Level, LevelProgress, Medal, Pupil, Submission, SubmissionStatus};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::error::ProgressResult;
use super::store::{
    CatalogRepository, LevelProgressRepository, ProgressStore, PupilRepository, StoreTransaction,
    SubmissionRepository,
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub levels: BTreeMap<i64, Level>,
    pub pupils: HashMap<Uuid, Pupil>,
    pub submissions: HashMap<Uuid, Submission>,
    pub level_progress: HashMap<(Uuid, i64), LevelProgress>,
    pub parts: HashMap<(Uuid, i64, String), bool>,
}

#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    state: Arc<Mutex<MemoryState>>,
    /// Write calls issued through any transaction, committed or not
    write_attempts: Arc<AtomicU64>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the default level catalog
    pub fn with_default_catalog() -> Self {
        let mut state = MemoryState::default();
        for level in default_levels() {
            state.levels.insert(level.level_number, level);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
            write_attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn insert_pupil(&self, pupil: Pupil) {
        self.state.lock().await.pupils.insert(pupil.id, pupil);
    }

    pub async fn insert_submission(&self, submission: Submission) {
        self.state
            .lock()
            .await
            .submissions
            .insert(submission.id, submission);
    }

    /// Copy of the committed state
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub fn write_attempts(&self) -> u64 {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> ProgressResult<InMemoryTransaction> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTransaction {
            guard,
            working,
            write_attempts: self.write_attempts.clone(),
        })
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    write_attempts: Arc<AtomicU64>,
}

impl InMemoryTransaction {
    fn record_write(&self) {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogRepository for InMemoryTransaction {
    async fn find_level(&mut self, level_number: i64) -> ProgressResult<Option<Level>> {
        Ok(self.working.levels.get(&level_number).cloned())
    }

    async fn list_levels(&mut self) -> ProgressResult<Vec<Level>> {
        Ok(self.working.levels.values().cloned().collect())
    }
}

#[async_trait]
impl PupilRepository for InMemoryTransaction {
    async fn find_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Option<Pupil>> {
        Ok(self.working.pupils.get(&pupil_id).cloned())
    }

    async fn update_progress(
        &mut self,
        pupil_id: Uuid,
        expected: i64,
        new_progress: i64,
    ) -> ProgressResult<bool> {
        self.record_write();
        match self.working.pupils.get_mut(&pupil_id) {
            Some(pupil) if pupil.progress == expected => {
                pupil.progress = new_progress;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryTransaction {
    async fn find_submission(&mut self, submission_id: Uuid) -> ProgressResult<Option<Submission>> {
        Ok(self.working.submissions.get(&submission_id).cloned())
    }

    async fn insert_submission(&mut self, submission: &Submission) -> ProgressResult<()> {
        self.record_write();
        self.working
            .submissions
            .insert(submission.id, submission.clone());
        Ok(())
    }

    async fn mark_reviewed(
        &mut self,
        submission_id: Uuid,
        feedback: &str,
        medal: Medal,
        reviewed_at: DateTime<Utc>,
    ) -> ProgressResult<bool> {
        self.record_write();
        match self.working.submissions.get_mut(&submission_id) {
            Some(submission) if submission.status == SubmissionStatus::Pending => {
                submission.status = SubmissionStatus::Reviewed;
                submission.feedback = Some(feedback.to_string());
                submission.medal = medal;
                submission.reviewed_at = Some(reviewed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn submissions_for_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Vec<Submission>> {
        let mut submissions: Vec<Submission> = self
            .working
            .submissions
            .values()
            .filter(|s| s.pupil_id == pupil_id)
            .cloned()
            .collect();
        submissions.sort_by_key(|s| s.created_at);
        Ok(submissions)
    }
}

#[async_trait]
impl LevelProgressRepository for InMemoryTransaction {
    async fn get_or_create(&mut self, pupil_id: Uuid, level_number: i64) -> ProgressResult<LevelProgress> {
        if let Some(existing) = self.working.level_progress.get(&(pupil_id, level_number)) {
            return Ok(existing.clone());
        }
        self.record_write();
        let created = LevelProgress::new(pupil_id, level_number);
        self.working
            .level_progress
            .insert((pupil_id, level_number), created.clone());
        Ok(created)
    }

    async fn save_level_progress(&mut self, progress: &LevelProgress) -> ProgressResult<()> {
        self.record_write();
        self.working
            .level_progress
            .insert((progress.pupil_id, progress.level_number), progress.clone());
        Ok(())
    }

    async fn set_part(
        &mut self,
        pupil_id: Uuid,
        level_number: i64,
        part: &str,
        completed: bool,
        _at: DateTime<Utc>,
    ) -> ProgressResult<()> {
        self.record_write();
        self.working
            .parts
            .insert((pupil_id, level_number, part.to_string()), completed);
        Ok(())
    }

    async fn completed_parts(&mut self, pupil_id: Uuid, level_number: i64) -> ProgressResult<Vec<String>> {
        Ok(self
            .working
            .parts
            .iter()
            .filter(|((p, l, _), done)| *p == pupil_id && *l == level_number && **done)
            .map(|((_, _, part), _)| part.clone())
            .collect())
    }

    async fn level_progress_for_pupil(&mut self, pupil_id: Uuid) -> ProgressResult<Vec<LevelProgress>> {
        let mut records: Vec<LevelProgress> = self
            .working
            .level_progress
            .values()
            .filter(|lp| lp.pupil_id == pupil_id)
            .cloned()
            .collect();
        records.sort_by_key(|lp| lp.level_number);
        Ok(records)
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn commit(self) -> ProgressResult<()> {
        let InMemoryTransaction {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}
