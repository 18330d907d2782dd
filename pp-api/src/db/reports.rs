//! Annotation report queries

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use pp_common::db::AnnotationReport;

use super::placeholders;

/// Insert a report filed by the user against an annotation
pub async fn insert(
    pool: &SqlitePool,
    user_guid: &str,
    annotation_guid: &str,
    reason: &str,
    comment: &str,
) -> Result<AnnotationReport, sqlx::Error> {
    let report = AnnotationReport {
        guid: Uuid::new_v4().to_string(),
        user_guid: user_guid.to_string(),
        annotation_guid: annotation_guid.to_string(),
        create_date: Utc::now().to_rfc3339(),
        reason: reason.to_string(),
        comment: comment.to_string(),
    };

    sqlx::query(
        r#"
        INSERT INTO annotation_reports (guid, user_guid, annotation_guid, create_date, reason, comment)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&report.guid)
    .bind(&report.user_guid)
    .bind(&report.annotation_guid)
    .bind(&report.create_date)
    .bind(&report.reason)
    .bind(&report.comment)
    .execute(pool)
    .await?;

    Ok(report)
}

/// Fetch one of the user's own reports
pub async fn get_for_user(
    pool: &SqlitePool,
    guid: &str,
    user_guid: &str,
) -> Result<Option<AnnotationReport>, sqlx::Error> {
    sqlx::query_as::<_, AnnotationReport>(
        "SELECT * FROM annotation_reports WHERE guid = ? AND user_guid = ?",
    )
    .bind(guid)
    .bind(user_guid)
    .fetch_optional(pool)
    .await
}

/// The user's reports against a given annotation
pub async fn list_for_annotation_and_user(
    pool: &SqlitePool,
    annotation_guid: &str,
    user_guid: &str,
) -> Result<Vec<AnnotationReport>, sqlx::Error> {
    sqlx::query_as::<_, AnnotationReport>(
        "SELECT * FROM annotation_reports WHERE annotation_guid = ? AND user_guid = ?
         ORDER BY create_date",
    )
    .bind(annotation_guid)
    .bind(user_guid)
    .fetch_all(pool)
    .await
}

/// The user's reports over a page of annotations, keyed by annotation guid
pub async fn by_user_for_annotations(
    pool: &SqlitePool,
    user_guid: &str,
    annotation_guids: &[String],
) -> Result<HashMap<String, Vec<AnnotationReport>>, sqlx::Error> {
    if annotation_guids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT * FROM annotation_reports WHERE user_guid = ? AND annotation_guid IN ({})
         ORDER BY create_date",
        placeholders(annotation_guids.len())
    );
    let mut query = sqlx::query_as::<_, AnnotationReport>(&sql).bind(user_guid);
    for guid in annotation_guids {
        query = query.bind(guid);
    }

    let mut by_annotation: HashMap<String, Vec<AnnotationReport>> = HashMap::new();
    for report in query.fetch_all(pool).await? {
        by_annotation
            .entry(report.annotation_guid.clone())
            .or_default()
            .push(report);
    }
    Ok(by_annotation)
}
