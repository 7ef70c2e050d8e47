//! Database initialization
//!
//! Creates the database on first run, applies the schema (idempotent
//! `CREATE TABLE IF NOT EXISTS`), seeds the level catalog and ensures every
//! runtime setting has a value.

use crate::db::catalog::seed_catalog;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Session lifetime after registration completes or login
pub const SETTING_SESSION_DURATION_HOURS: &str = "session_duration_hours";
/// Window in which a freshly registered parent may add a child
pub const SETTING_REGISTRATION_DURATION_MINUTES: &str = "registration_duration_minutes";
/// Upper bound on retrying a review that hit a transient store conflict
pub const SETTING_REVIEW_MAX_LOCK_WAIT_MS: &str = "review_max_lock_wait_ms";
/// Broadcast channel capacity of the event bus
pub const SETTING_EVENT_BUS_CAPACITY: &str = "event_bus_capacity";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Short busy timeout; contended reviews are retried with backoff instead
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(250));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    prepare(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema and catalog
///
/// Uses a single connection: every connection to `sqlite::memory:` would
/// otherwise see its own empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    prepare(&pool).await?;

    Ok(pool)
}

async fn prepare(pool: &SqlitePool) -> Result<()> {
    create_schema(pool).await?;
    seed_catalog(pool).await?;
    init_default_settings(pool).await?;
    Ok(())
}

/// Create every table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_user_settings_table(pool).await?;
    create_sessions_table(pool).await?;
    create_pending_registrations_table(pool).await?;
    create_catalog_tables(pool).await?;
    create_pupils_table(pool).await?;
    create_level_progress_tables(pool).await?;
    create_submissions_table(pool).await?;
    create_messages_table(pool).await?;
    create_notifications_table(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Stores runtime configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('COACH', 'PARENT')),
            coach_id TEXT REFERENCES users(id),
            phone TEXT,
            bio TEXT,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Per-user preferences; a missing row means all defaults
async fn create_user_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_settings (
            user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            push_notifications INTEGER NOT NULL DEFAULT 0,
            email_notifications INTEGER NOT NULL DEFAULT 0,
            theme TEXT NOT NULL DEFAULT 'LIGHT' CHECK (theme IN ('LIGHT', 'DARK')),
            language TEXT NOT NULL DEFAULT 'en' CHECK (language IN ('en', 'nl', 'fr')),
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Store-backed registration window (one per user)
async fn create_pending_registrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pending_registrations (
            user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_catalog_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS levels (
            level_number INTEGER PRIMARY KEY CHECK (level_number >= 1),
            title TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS level_parts (
            level_number INTEGER NOT NULL REFERENCES levels(level_number),
            part TEXT NOT NULL,
            ordinal INTEGER NOT NULL,
            PRIMARY KEY (level_number, part)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_pupils_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pupils (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            date_of_birth TEXT,
            parent_id TEXT NOT NULL REFERENCES users(id),
            coach_id TEXT NOT NULL REFERENCES users(id),
            progress INTEGER NOT NULL DEFAULT 0 CHECK (progress >= 0),
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Level progress records plus the per-part rows they are derived from
///
/// The primary key enforces one record per (pupil, level).
async fn create_level_progress_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS level_progress (
            pupil_id TEXT NOT NULL REFERENCES pupils(id) ON DELETE CASCADE,
            level_number INTEGER NOT NULL REFERENCES levels(level_number),
            first_part_completed INTEGER NOT NULL DEFAULT 0,
            fully_completed INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT,
            PRIMARY KEY (pupil_id, level_number),
            CHECK (fully_completed = 0 OR first_part_completed = 1)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS level_part_progress (
            pupil_id TEXT NOT NULL REFERENCES pupils(id) ON DELETE CASCADE,
            level_number INTEGER NOT NULL,
            part TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT,
            PRIMARY KEY (pupil_id, level_number, part),
            FOREIGN KEY (level_number, part) REFERENCES level_parts(level_number, part)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            id TEXT PRIMARY KEY,
            pupil_id TEXT NOT NULL REFERENCES pupils(id) ON DELETE CASCADE,
            level_number INTEGER NOT NULL REFERENCES levels(level_number),
            video_url TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING' CHECK (status IN ('PENDING', 'REVIEWED')),
            feedback TEXT,
            medal TEXT NOT NULL DEFAULT 'NONE' CHECK (medal IN ('NONE', 'BRONZE', 'SILVER', 'GOLD')),
            created_at TEXT NOT NULL,
            reviewed_at TEXT,
            is_read INTEGER NOT NULL DEFAULT 0,
            CHECK (status = 'PENDING' OR feedback IS NOT NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_pupil ON submissions(pupil_id, level_number)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            parent_id TEXT NOT NULL REFERENCES users(id),
            coach_id TEXT NOT NULL REFERENCES users(id),
            sender TEXT NOT NULL CHECK (sender IN ('COACH', 'PARENT')),
            content TEXT NOT NULL,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(parent_id, coach_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_notifications_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            recipient_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            url TEXT NOT NULL,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values and resets NULL
/// values to their defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, SETTING_SESSION_DURATION_HOURS, "48").await?;
    ensure_setting(pool, SETTING_REGISTRATION_DURATION_MINUTES, "30").await?;
    ensure_setting(pool, SETTING_REVIEW_MAX_LOCK_WAIT_MS, "5000").await?;
    ensure_setting(pool, SETTING_EVENT_BUS_CAPACITY, "1000").await?;
    Ok(())
}

async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    // INSERT OR IGNORE handles concurrent initialization
    let inserted = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?
        .rows_affected();

    if inserted > 0 {
        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let reset = sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value IS NULL")
        .bind(default_value)
        .bind(key)
        .execute(pool)
        .await?
        .rows_affected();

    if reset > 0 {
        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Read an integer setting, falling back to `default` when absent or malformed
pub async fn get_setting_i64(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match value.flatten() {
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(parsed) => Ok(parsed),
            Err(_) => {
                warn!("Setting '{}' has non-integer value '{}', using {}", key, raw, default);
                Ok(default)
            }
        },
        None => Ok(default),
    }
}

/// Write a setting value
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}
