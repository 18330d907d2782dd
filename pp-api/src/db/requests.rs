//! Annotation request queries

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use pp_common::db::AnnotationRequest;
use pp_common::urlnorm::standardize_url_id;

/// Insert a request for annotating a page
pub async fn insert(
    pool: &SqlitePool,
    user_guid: &str,
    url: &str,
    quote: &str,
    comment: &str,
    notification_email: &str,
) -> Result<AnnotationRequest, sqlx::Error> {
    let request = AnnotationRequest {
        guid: Uuid::new_v4().to_string(),
        user_guid: user_guid.to_string(),
        create_date: Utc::now().to_rfc3339(),
        url: url.to_string(),
        url_id: standardize_url_id(url),
        quote: quote.to_string(),
        comment: comment.to_string(),
        notification_email: notification_email.to_string(),
        active: true,
    };

    sqlx::query(
        r#"
        INSERT INTO annotation_requests (guid, user_guid, create_date, url, url_id, quote,
                                         comment, notification_email, active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&request.guid)
    .bind(&request.user_guid)
    .bind(&request.create_date)
    .bind(&request.url)
    .bind(&request.url_id)
    .bind(&request.quote)
    .bind(&request.comment)
    .bind(&request.notification_email)
    .bind(request.active)
    .execute(pool)
    .await?;

    Ok(request)
}

pub async fn get(pool: &SqlitePool, guid: &str) -> Result<Option<AnnotationRequest>, sqlx::Error> {
    sqlx::query_as::<_, AnnotationRequest>("SELECT * FROM annotation_requests WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await
}

/// Requests subscribed to a page, i.e. active with a notification address
pub async fn subscribers_for_url_id(
    pool: &SqlitePool,
    url_id: &str,
) -> Result<Vec<AnnotationRequest>, sqlx::Error> {
    sqlx::query_as::<_, AnnotationRequest>(
        "SELECT * FROM annotation_requests
         WHERE url_id = ? AND active = 1 AND notification_email != ''",
    )
    .bind(url_id)
    .fetch_all(pool)
    .await
}

/// Drop the subscription of a request (unsubscribe link)
pub async fn clear_notification_email(pool: &SqlitePool, guid: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE annotation_requests SET notification_email = '' WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;
    Ok(())
}
