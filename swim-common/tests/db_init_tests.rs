//! Tests for database initialization
//!
//! Covers automatic creation, idempotent re-open, catalog seeding and
//! default settings.

use std::path::PathBuf;
use swim_common::db::init::{get_setting_i64, init_database, init_memory_database, set_setting};
use swim_common::db::{DEFAULT_CATALOG, SETTING_SESSION_DURATION_HOURS};

fn temp_db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("nested").join("swimcoach.db")
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db_path(&dir);
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = temp_db_path(&dir);

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    // Catalog seeding is idempotent
    let levels: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM levels")
        .fetch_one(&pool2.unwrap())
        .await
        .unwrap();
    assert_eq!(levels, DEFAULT_CATALOG.len() as i64);
}

#[tokio::test]
async fn test_catalog_parts_seeded_in_order() {
    let pool = init_memory_database().await.unwrap();

    let parts: Vec<String> = sqlx::query_scalar(
        "SELECT part FROM level_parts WHERE level_number = 10 ORDER BY ordinal",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(parts, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let pool = init_memory_database().await.unwrap();

    let hours = get_setting_i64(&pool, SETTING_SESSION_DURATION_HOURS, 0)
        .await
        .unwrap();
    assert_eq!(hours, 48);

    let missing = get_setting_i64(&pool, "no_such_setting", 7).await.unwrap();
    assert_eq!(missing, 7);
}

#[tokio::test]
async fn test_malformed_setting_falls_back_to_default() {
    let pool = init_memory_database().await.unwrap();

    set_setting(&pool, SETTING_SESSION_DURATION_HOURS, "two days")
        .await
        .unwrap();

    let hours = get_setting_i64(&pool, SETTING_SESSION_DURATION_HOURS, 48)
        .await
        .unwrap();
    assert_eq!(hours, 48);
}

#[tokio::test]
async fn test_level_progress_uniqueness_enforced() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query(
        "INSERT INTO users (id, email, name, role, password_hash, created_at)
         VALUES ('c', 'coach@example.com', 'Coach', 'COACH', '', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO pupils (id, name, parent_id, coach_id, created_at)
         VALUES ('p', 'Pupil', 'c', 'c', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let insert = "INSERT INTO level_progress (pupil_id, level_number) VALUES ('p', 1)";
    sqlx::query(insert).execute(&pool).await.unwrap();
    let duplicate = sqlx::query(insert).execute(&pool).await;

    assert!(duplicate.is_err(), "second (pupil, level) record must be rejected");
}

#[tokio::test]
async fn test_fully_completed_requires_first_part() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query(
        "INSERT INTO users (id, email, name, role, password_hash, created_at)
         VALUES ('c', 'coach@example.com', 'Coach', 'COACH', '', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO pupils (id, name, parent_id, coach_id, created_at)
         VALUES ('p', 'Pupil', 'c', 'c', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = sqlx::query(
        "INSERT INTO level_progress (pupil_id, level_number, first_part_completed, fully_completed)
         VALUES ('p', 1, 0, 1)",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err());
}
