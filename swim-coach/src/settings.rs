//! Runtime tunables read from the `settings` table at startup

use chrono::Duration;
use sqlx::SqlitePool;
use swim_common::db::{
    get_setting_i64, SETTING_EVENT_BUS_CAPACITY, SETTING_REGISTRATION_DURATION_MINUTES,
    SETTING_REVIEW_MAX_LOCK_WAIT_MS, SETTING_SESSION_DURATION_HOURS,
};
use swim_common::Result;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub session_duration_hours: i64,
    pub registration_duration_minutes: i64,
    pub review_max_lock_wait_ms: u64,
    pub event_bus_capacity: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            session_duration_hours: 48,
            registration_duration_minutes: 30,
            review_max_lock_wait_ms: 5000,
            event_bus_capacity: 1000,
        }
    }
}

impl RuntimeSettings {
    /// Load every tunable; malformed or non-positive values fall back to defaults
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let defaults = Self::default();

        let session_duration_hours = positive_or(
            SETTING_SESSION_DURATION_HOURS,
            get_setting_i64(pool, SETTING_SESSION_DURATION_HOURS, defaults.session_duration_hours).await?,
            defaults.session_duration_hours,
        );
        let registration_duration_minutes = positive_or(
            SETTING_REGISTRATION_DURATION_MINUTES,
            get_setting_i64(
                pool,
                SETTING_REGISTRATION_DURATION_MINUTES,
                defaults.registration_duration_minutes,
            )
            .await?,
            defaults.registration_duration_minutes,
        );
        let review_max_lock_wait_ms = positive_or(
            SETTING_REVIEW_MAX_LOCK_WAIT_MS,
            get_setting_i64(
                pool,
                SETTING_REVIEW_MAX_LOCK_WAIT_MS,
                defaults.review_max_lock_wait_ms as i64,
            )
            .await?,
            defaults.review_max_lock_wait_ms as i64,
        );
        let event_bus_capacity = positive_or(
            SETTING_EVENT_BUS_CAPACITY,
            get_setting_i64(pool, SETTING_EVENT_BUS_CAPACITY, defaults.event_bus_capacity as i64).await?,
            defaults.event_bus_capacity as i64,
        );

        Ok(Self {
            session_duration_hours,
            registration_duration_minutes,
            review_max_lock_wait_ms: review_max_lock_wait_ms as u64,
            event_bus_capacity: event_bus_capacity as usize,
        })
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::hours(self.session_duration_hours)
    }

    pub fn registration_window(&self) -> Duration {
        Duration::minutes(self.registration_duration_minutes)
    }
}

fn positive_or(key: &str, value: i64, default: i64) -> i64 {
    if value > 0 {
        value
    } else {
        warn!("Setting '{}' must be positive, got {}; using {}", key, value, default);
        default
    }
}
