//! Annotation queries

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use pp_common::consts::CheckStatus;
use pp_common::db::Annotation;
use pp_common::urlnorm::standardize_url_id;

use super::placeholders;

/// Fields accepted when creating an annotation
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub user_guid: String,
    pub url: String,
    pub range: String,
    pub quote: String,
    pub quote_context: String,
    pub publisher: String,
    pub publisher_annotation_id: Option<String>,
    pub pp_category: String,
    pub demagog_category: Option<String>,
    pub comment: String,
    pub annotation_link: String,
    pub annotation_link_title: String,
    pub annotation_request_guid: Option<String>,
    /// Overridden by the publisher sync (fact-check date); None means now
    pub create_date: Option<String>,
}

/// Insert a new annotation; `url_id` is derived from `url`
pub async fn insert(pool: &SqlitePool, new: NewAnnotation) -> Result<Annotation, sqlx::Error> {
    let annotation = Annotation {
        guid: Uuid::new_v4().to_string(),
        user_guid: new.user_guid,
        create_date: new.create_date.unwrap_or_else(|| Utc::now().to_rfc3339()),
        url_id: standardize_url_id(&new.url),
        url: new.url,
        range: new.range,
        quote: new.quote,
        quote_context: new.quote_context,
        active: true,
        publisher: new.publisher,
        publisher_annotation_id: new.publisher_annotation_id,
        pp_category: new.pp_category,
        demagog_category: new.demagog_category,
        check_status: Some(CheckStatus::Unverified.as_str().to_string()),
        comment: new.comment,
        annotation_link: new.annotation_link,
        annotation_link_title: new.annotation_link_title,
        annotation_request_guid: new.annotation_request_guid,
    };

    sqlx::query(
        r#"
        INSERT INTO annotations (guid, user_guid, create_date, url, url_id, range, quote,
                                 quote_context, active, publisher, publisher_annotation_id,
                                 pp_category, demagog_category, check_status, comment,
                                 annotation_link, annotation_link_title, annotation_request_guid)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&annotation.guid)
    .bind(&annotation.user_guid)
    .bind(&annotation.create_date)
    .bind(&annotation.url)
    .bind(&annotation.url_id)
    .bind(&annotation.range)
    .bind(&annotation.quote)
    .bind(&annotation.quote_context)
    .bind(annotation.active)
    .bind(&annotation.publisher)
    .bind(&annotation.publisher_annotation_id)
    .bind(&annotation.pp_category)
    .bind(&annotation.demagog_category)
    .bind(&annotation.check_status)
    .bind(&annotation.comment)
    .bind(&annotation.annotation_link)
    .bind(&annotation.annotation_link_title)
    .bind(&annotation.annotation_request_guid)
    .execute(pool)
    .await?;

    Ok(annotation)
}

/// Fetch an annotation regardless of its active flag
pub async fn get(pool: &SqlitePool, guid: &str) -> Result<Option<Annotation>, sqlx::Error> {
    sqlx::query_as::<_, Annotation>("SELECT * FROM annotations WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await
}

/// Fetch an active annotation
pub async fn get_active(pool: &SqlitePool, guid: &str) -> Result<Option<Annotation>, sqlx::Error> {
    sqlx::query_as::<_, Annotation>("SELECT * FROM annotations WHERE guid = ? AND active = 1")
        .bind(guid)
        .fetch_optional(pool)
        .await
}

/// The active annotation targeted by one of the user's upvotes
pub async fn get_active_by_upvote(
    pool: &SqlitePool,
    upvote_guid: &str,
    user_guid: &str,
) -> Result<Option<Annotation>, sqlx::Error> {
    sqlx::query_as::<_, Annotation>(
        r#"
        SELECT a.* FROM annotations a
        JOIN annotation_upvotes v ON v.annotation_guid = a.guid
        WHERE v.guid = ? AND v.user_guid = ? AND a.active = 1
        "#,
    )
    .bind(upvote_guid)
    .bind(user_guid)
    .fetch_optional(pool)
    .await
}

/// The active annotation targeted by one of the user's reports
pub async fn get_active_by_report(
    pool: &SqlitePool,
    report_guid: &str,
    user_guid: &str,
) -> Result<Option<Annotation>, sqlx::Error> {
    sqlx::query_as::<_, Annotation>(
        r#"
        SELECT a.* FROM annotations a
        JOIN annotation_reports r ON r.annotation_guid = a.guid
        WHERE r.guid = ? AND r.user_guid = ? AND a.active = 1
        "#,
    )
    .bind(report_guid)
    .bind(user_guid)
    .fetch_optional(pool)
    .await
}

/// List filter resolved from query parameters
#[derive(Debug, Default)]
pub struct AnnotationFilter {
    pub url_id: Option<String>,
    pub check_statuses: Vec<String>,
}

fn filter_clause(filter: &AnnotationFilter) -> String {
    let mut clause = String::from("active = 1");
    if filter.url_id.is_some() {
        clause.push_str(" AND url_id = ?");
    }
    if !filter.check_statuses.is_empty() {
        clause.push_str(&format!(
            " AND check_status IN ({})",
            placeholders(filter.check_statuses.len())
        ));
    }
    clause
}

/// Count active annotations matching the filter
pub async fn count(pool: &SqlitePool, filter: &AnnotationFilter) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COUNT(*) FROM annotations WHERE {}",
        filter_clause(filter)
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    if let Some(url_id) = &filter.url_id {
        query = query.bind(url_id);
    }
    for status in &filter.check_statuses {
        query = query.bind(status);
    }
    query.fetch_one(pool).await
}

/// Page of active annotations matching the filter
///
/// `order_sql` comes from the ordering whitelist in [`crate::filters`].
pub async fn list(
    pool: &SqlitePool,
    filter: &AnnotationFilter,
    order_sql: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Annotation>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM annotations WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
        filter_clause(filter),
        order_sql
    );
    let mut query = sqlx::query_as::<_, Annotation>(&sql);
    if let Some(url_id) = &filter.url_id {
        query = query.bind(url_id);
    }
    for status in &filter.check_statuses {
        query = query.bind(status);
    }
    query.bind(limit).bind(offset).fetch_all(pool).await
}

/// Patchable annotation attributes; None fields stay untouched
#[derive(Debug, Default)]
pub struct AnnotationPatch {
    pub pp_category: Option<String>,
    pub comment: Option<String>,
    pub annotation_link: Option<String>,
    pub annotation_link_title: Option<String>,
}

impl AnnotationPatch {
    pub fn is_empty(&self) -> bool {
        self.pp_category.is_none()
            && self.comment.is_none()
            && self.annotation_link.is_none()
            && self.annotation_link_title.is_none()
    }
}

/// Apply a patch to an annotation
pub async fn update(
    pool: &SqlitePool,
    guid: &str,
    patch: &AnnotationPatch,
) -> Result<(), sqlx::Error> {
    let mut sets = Vec::new();
    let mut binds = Vec::new();
    if let Some(value) = &patch.pp_category {
        sets.push("pp_category = ?");
        binds.push(value);
    }
    if let Some(value) = &patch.comment {
        sets.push("comment = ?");
        binds.push(value);
    }
    if let Some(value) = &patch.annotation_link {
        sets.push("annotation_link = ?");
        binds.push(value);
    }
    if let Some(value) = &patch.annotation_link_title {
        sets.push("annotation_link_title = ?");
        binds.push(value);
    }
    if sets.is_empty() {
        return Ok(());
    }

    let sql = format!("UPDATE annotations SET {} WHERE guid = ?", sets.join(", "));
    let mut query = sqlx::query(&sql);
    for value in binds {
        query = query.bind(value);
    }
    query.bind(guid).execute(pool).await?;
    Ok(())
}

/// Deactivate an annotation (rows are never deleted)
pub async fn soft_delete(pool: &SqlitePool, guid: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE annotations SET active = 0 WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;
    Ok(())
}

/// Upvote count for one annotation, excluding the given user's own vote
pub async fn upvote_count_except_user(
    pool: &SqlitePool,
    annotation_guid: &str,
    user_guid: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM annotation_upvotes WHERE annotation_guid = ? AND user_guid != ?",
    )
    .bind(annotation_guid)
    .bind(user_guid)
    .fetch_one(pool)
    .await
}

/// Batched variant of [`upvote_count_except_user`] for list pages
pub async fn upvote_counts_except_user(
    pool: &SqlitePool,
    annotation_guids: &[String],
    user_guid: &str,
) -> Result<HashMap<String, i64>, sqlx::Error> {
    if annotation_guids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT annotation_guid, COUNT(*) FROM annotation_upvotes
         WHERE user_guid != ? AND annotation_guid IN ({})
         GROUP BY annotation_guid",
        placeholders(annotation_guids.len())
    );
    let mut query = sqlx::query_as::<_, (String, i64)>(&sql).bind(user_guid);
    for guid in annotation_guids {
        query = query.bind(guid);
    }
    Ok(query.fetch_all(pool).await?.into_iter().collect())
}
