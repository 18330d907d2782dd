//! Database schema migrations
//!
//! Versioned migrations let existing database files upgrade in place.
//! Migrations must stay idempotent: every step checks whether its change
//! is already present before applying it.

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let version = get_schema_version(pool).await?;

    if version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    if version < CURRENT_SCHEMA_VERSION {
        info!(
            "Database schema migrated from v{} to v{}",
            version, CURRENT_SCHEMA_VERSION
        );
    }

    Ok(())
}

/// v2: add the check_status column to annotations
///
/// Databases created before the page-verification workflow lack the column;
/// freshly created tables already carry it.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('annotations') WHERE name = 'check_status'",
    )
    .fetch_one(pool)
    .await?;

    if has_column == 0 {
        sqlx::query("ALTER TABLE annotations ADD COLUMN check_status TEXT DEFAULT 'UNVERIFIED'")
            .execute(pool)
            .await?;
        info!("Migration v2: added check_status to annotations");
    }
    Ok(())
}
