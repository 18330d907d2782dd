//! Database initialization
//!
//! Both services open the same SQLite database. Initialization is idempotent:
//! tables are created if missing, migrations bring older files up to date,
//! and the system user owning synced annotations is seeded on first run.

use crate::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Options apply to every pooled connection: foreign keys enforced, WAL
    // so API reads don't block sync writes
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database for tests
///
/// Capped at one connection: every `:memory:` connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Schema creation (idempotent - safe to call multiple times)
    create_users_table(pool).await?;
    create_annotation_requests_table(pool).await?;
    create_annotations_table(pool).await?;
    create_annotation_upvotes_table(pool).await?;
    create_annotation_reports_table(pool).await?;

    // Versioned migrations for databases created by older builds
    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

/// Look up or create a system user (e.g. the Demagog sync owner), returning its guid
pub async fn ensure_system_user(pool: &SqlitePool, username: &str) -> Result<String> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT guid FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    if let Some(guid) = existing {
        return Ok(guid);
    }

    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO users (guid, username, provider, create_date)
        VALUES (?, ?, 'system', ?)
        "#,
    )
    .bind(&guid)
    .bind(username)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    info!("Seeded system user '{}'", username);
    Ok(guid)
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT,
            provider TEXT,
            provider_user_id TEXT,
            create_date TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Social logins look up users by their provider identity
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_users_provider ON users (provider, provider_user_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_annotations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotations (
            guid TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid),
            create_date TEXT NOT NULL,
            url TEXT NOT NULL,
            url_id TEXT NOT NULL,
            range TEXT NOT NULL DEFAULT '',
            quote TEXT NOT NULL DEFAULT '',
            quote_context TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 1,
            publisher TEXT NOT NULL DEFAULT 'PP',
            publisher_annotation_id TEXT,
            pp_category TEXT NOT NULL,
            demagog_category TEXT,
            check_status TEXT DEFAULT 'UNVERIFIED',
            comment TEXT NOT NULL DEFAULT '',
            annotation_link TEXT NOT NULL,
            annotation_link_title TEXT NOT NULL,
            annotation_request_guid TEXT REFERENCES annotation_requests(guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Page lookup is the hot path of the extension
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_annotations_url_id ON annotations (url_id)")
        .execute(pool)
        .await?;

    // Publisher sync reconciles on the external id
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_annotations_publisher_id
         ON annotations (publisher, publisher_annotation_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_annotation_upvotes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotation_upvotes (
            guid TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid),
            annotation_guid TEXT NOT NULL REFERENCES annotations(guid),
            create_date TEXT NOT NULL,
            UNIQUE (user_guid, annotation_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_annotation_reports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotation_reports (
            guid TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid),
            annotation_guid TEXT NOT NULL REFERENCES annotations(guid),
            create_date TEXT NOT NULL,
            reason TEXT NOT NULL,
            comment TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_annotation_requests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotation_requests (
            guid TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid),
            create_date TEXT NOT NULL,
            url TEXT NOT NULL,
            url_id TEXT NOT NULL,
            quote TEXT NOT NULL DEFAULT '',
            comment TEXT NOT NULL DEFAULT '',
            notification_email TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_annotation_requests_url_id ON annotation_requests (url_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
