//! User queries

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use pp_common::db::User;

pub async fn get(pool: &SqlitePool, guid: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await
}

/// Author of an active annotation
pub async fn get_by_annotation(
    pool: &SqlitePool,
    annotation_guid: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM users u
        JOIN annotations a ON a.user_guid = u.guid
        WHERE a.guid = ? AND a.active = 1
        "#,
    )
    .bind(annotation_guid)
    .fetch_optional(pool)
    .await
}

/// Create an anonymous user for a client signing up lazily
pub async fn create_lazy(pool: &SqlitePool) -> Result<User, sqlx::Error> {
    let guid = Uuid::new_v4().to_string();
    let user = User {
        username: format!("lazy-{}", &guid[..8]),
        guid,
        email: None,
        provider: None,
        provider_user_id: None,
        create_date: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        "INSERT INTO users (guid, username, create_date) VALUES (?, ?, ?)",
    )
    .bind(&user.guid)
    .bind(&user.username)
    .bind(&user.create_date)
    .execute(pool)
    .await?;

    Ok(user)
}

/// Find a user by social identity, creating it on first login
pub async fn get_or_create_social(
    pool: &SqlitePool,
    provider: &str,
    provider_user_id: &str,
    email: Option<&str>,
) -> Result<User, sqlx::Error> {
    let existing = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE provider = ? AND provider_user_id = ?",
    )
    .bind(provider)
    .bind(provider_user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(user) = existing {
        return Ok(user);
    }

    let guid = Uuid::new_v4().to_string();
    let user = User {
        // Usernames are unique; provider ids are stable and unique per provider
        username: format!("{}-{}", provider, provider_user_id),
        guid,
        email: email.map(|e| e.to_string()),
        provider: Some(provider.to_string()),
        provider_user_id: Some(provider_user_id.to_string()),
        create_date: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (guid, username, email, provider, provider_user_id, create_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.guid)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.provider)
    .bind(&user.provider_user_id)
    .bind(&user.create_date)
    .execute(pool)
    .await?;

    Ok(user)
}
