//! Level catalog seed data
//!
//! The curriculum is fixed reference data: levels are identified by an
//! ascending `level_number` and each level lists its required parts in the
//! order they are practised.

use sqlx::SqlitePool;
use tracing::info;

use crate::db::models::Level;
use crate::Result;

/// (level_number, title, required parts)
pub const DEFAULT_CATALOG: &[(i64, &str, &[&str])] = &[
    (1, "Water confidence", &["A", "B"]),
    (2, "Floating on front and back", &["A", "B"]),
    (3, "Gliding", &["A", "B"]),
    (4, "Flutter kick", &["A", "B"]),
    (5, "Rhythmic breathing", &["A", "B"]),
    (6, "Front crawl arms", &["A", "B"]),
    (7, "Backstroke", &["A", "B"]),
    (8, "Breaststroke", &["A", "B"]),
    (9, "Treading water", &["A", "B"]),
    (10, "Endurance swim", &["A", "B", "C"]),
];

/// The default catalog as model values
pub fn default_levels() -> Vec<Level> {
    DEFAULT_CATALOG
        .iter()
        .map(|(level_number, title, parts)| Level {
            level_number: *level_number,
            title: title.to_string(),
            parts: parts.iter().map(|p| p.to_string()).collect(),
        })
        .collect()
}

/// Insert the default catalog (idempotent)
pub async fn seed_catalog(pool: &SqlitePool) -> Result<()> {
    let mut inserted = 0u64;
    for (level_number, title, parts) in DEFAULT_CATALOG {
        let result = sqlx::query("INSERT OR IGNORE INTO levels (level_number, title) VALUES (?, ?)")
            .bind(level_number)
            .bind(title)
            .execute(pool)
            .await?;
        inserted += result.rows_affected();

        for (ordinal, part) in parts.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO level_parts (level_number, part, ordinal) VALUES (?, ?, ?)",
            )
            .bind(level_number)
            .bind(part)
            .bind(ordinal as i64)
            .execute(pool)
            .await?;
        }
    }

    if inserted > 0 {
        info!("Seeded {} catalog levels", inserted);
    }
    Ok(())
}
