//! Annotation upvote queries

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use pp_common::db::AnnotationUpvote;

use super::placeholders;

/// Insert an upvote; returns None when the user already upvoted the annotation
pub async fn insert(
    pool: &SqlitePool,
    user_guid: &str,
    annotation_guid: &str,
) -> Result<Option<AnnotationUpvote>, sqlx::Error> {
    let upvote = AnnotationUpvote {
        guid: Uuid::new_v4().to_string(),
        user_guid: user_guid.to_string(),
        annotation_guid: annotation_guid.to_string(),
        create_date: Utc::now().to_rfc3339(),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO annotation_upvotes (guid, user_guid, annotation_guid, create_date)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&upvote.guid)
    .bind(&upvote.user_guid)
    .bind(&upvote.annotation_guid)
    .bind(&upvote.create_date)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(Some(upvote)),
        Err(e) => {
            let unique_violation = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if unique_violation {
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

/// Fetch one of the user's own upvotes
pub async fn get_for_user(
    pool: &SqlitePool,
    guid: &str,
    user_guid: &str,
) -> Result<Option<AnnotationUpvote>, sqlx::Error> {
    sqlx::query_as::<_, AnnotationUpvote>(
        "SELECT * FROM annotation_upvotes WHERE guid = ? AND user_guid = ?",
    )
    .bind(guid)
    .bind(user_guid)
    .fetch_optional(pool)
    .await
}

/// The user's upvote on a given annotation, if any
pub async fn get_by_annotation_and_user(
    pool: &SqlitePool,
    annotation_guid: &str,
    user_guid: &str,
) -> Result<Option<AnnotationUpvote>, sqlx::Error> {
    sqlx::query_as::<_, AnnotationUpvote>(
        "SELECT * FROM annotation_upvotes WHERE annotation_guid = ? AND user_guid = ?",
    )
    .bind(annotation_guid)
    .bind(user_guid)
    .fetch_optional(pool)
    .await
}

/// Retract an upvote
pub async fn delete(pool: &SqlitePool, guid: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM annotation_upvotes WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;
    Ok(())
}

/// The user's upvotes over a page of annotations, keyed by annotation guid
pub async fn by_user_for_annotations(
    pool: &SqlitePool,
    user_guid: &str,
    annotation_guids: &[String],
) -> Result<HashMap<String, AnnotationUpvote>, sqlx::Error> {
    if annotation_guids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT * FROM annotation_upvotes WHERE user_guid = ? AND annotation_guid IN ({})",
        placeholders(annotation_guids.len())
    );
    let mut query = sqlx::query_as::<_, AnnotationUpvote>(&sql).bind(user_guid);
    for guid in annotation_guids {
        query = query.bind(guid);
    }
    Ok(query
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|upvote| (upvote.annotation_guid.clone(), upvote))
        .collect())
}
