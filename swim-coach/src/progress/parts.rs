//! Part marking
//!
//! Parents tick off the parts of a level as their child practises them. The
//! level's flags follow the part rows: the first catalog part sets
//! `first_part_completed`, all parts set `fully_completed`. Flags are never
//! cleared by unmarking, and part marking never moves the pupil's progress.

use chrono::Utc;
use serde::Serialize;
use swim_common::db::LevelProgress;
use tracing::debug;
use uuid::Uuid;

use super::error::{ProgressError, ProgressResult};
use super::service::ProgressService;
use super::store::{
    CatalogRepository, LevelProgressRepository, ProgressStore, PupilRepository, StoreTransaction,
};
use crate::utils::retry_on_conflict;

#[derive(Debug, Clone, Serialize)]
pub struct PartMarkOutcome {
    pub level_progress: LevelProgress,
    /// Parts currently completed, in catalog order
    pub completed_parts: Vec<String>,
    pub newly_fully_completed: bool,
}

impl<S: ProgressStore> ProgressService<S> {
    pub async fn mark_part(
        &self,
        pupil_id: Uuid,
        level_number: i64,
        part: &str,
        completed: bool,
    ) -> ProgressResult<PartMarkOutcome> {
        retry_on_conflict("mark_part", self.max_lock_wait_ms, move || {
            self.mark_part_once(pupil_id, level_number, part, completed)
        })
        .await
    }

    async fn mark_part_once(
        &self,
        pupil_id: Uuid,
        level_number: i64,
        part: &str,
        completed: bool,
    ) -> ProgressResult<PartMarkOutcome> {
        let mut tx = self.store.begin().await?;

        let level = tx
            .find_level(level_number)
            .await?
            .ok_or_else(|| ProgressError::not_found("Level", level_number))?;
        if !level.parts.iter().any(|p| p == part) {
            return Err(ProgressError::InvalidInput(format!(
                "Level {} has no part '{}'",
                level_number, part
            )));
        }
        if tx.find_pupil(pupil_id).await?.is_none() {
            return Err(ProgressError::not_found("Pupil", pupil_id));
        }

        let now = Utc::now();
        tx.set_part(pupil_id, level_number, part, completed, now).await?;

        let done = tx.completed_parts(pupil_id, level_number).await?;
        let completed_parts: Vec<String> = level
            .parts
            .iter()
            .filter(|p| done.contains(p))
            .cloned()
            .collect();

        let mut record = tx.get_or_create(pupil_id, level_number).await?;
        let before = record.clone();

        let first_part_done = level
            .parts
            .first()
            .map(|first| completed_parts.contains(first))
            .unwrap_or(false);
        if first_part_done {
            record.first_part_completed = true;
        }

        let mut newly_fully_completed = false;
        if completed_parts.len() == level.parts.len() {
            newly_fully_completed = record.complete(now);
        }

        if record != before {
            tx.save_level_progress(&record).await?;
        }
        tx.commit().await?;

        debug!(
            %pupil_id,
            level = level_number,
            part,
            completed,
            fully_completed = record.fully_completed,
            "Part marked"
        );

        Ok(PartMarkOutcome {
            level_progress: record,
            completed_parts,
            newly_fully_completed,
        })
    }
}
