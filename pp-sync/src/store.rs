//! Annotation persistence for the publisher sync

use sqlx::SqlitePool;
use uuid::Uuid;

use pp_common::consts::{CheckStatus, Publisher};
use pp_common::db::Annotation;
use pp_common::urlnorm::standardize_url_id;
use pp_common::Result;

/// Annotation fields derived from a Demagog statement
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedFields {
    pub url: String,
    pub quote: String,
    pub pp_category: String,
    pub demagog_category: String,
    pub annotation_link: String,
    pub annotation_link_title: String,
    pub create_date: String,
}

/// The annotation previously synced for this external statement, if any
pub async fn find_by_publisher_id(
    pool: &SqlitePool,
    publisher_annotation_id: &str,
) -> Result<Option<Annotation>> {
    let annotation = sqlx::query_as::<_, Annotation>(
        "SELECT * FROM annotations WHERE publisher = ? AND publisher_annotation_id = ?",
    )
    .bind(Publisher::Demagog.as_str())
    .bind(publisher_annotation_id)
    .fetch_optional(pool)
    .await?;
    Ok(annotation)
}

/// Insert a fresh annotation for a statement never seen before
pub async fn insert_synced(
    pool: &SqlitePool,
    user_guid: &str,
    publisher_annotation_id: &str,
    fields: &SyncedFields,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO annotations (guid, user_guid, create_date, url, url_id, range, quote,
                                 quote_context, active, publisher, publisher_annotation_id,
                                 pp_category, demagog_category, check_status, comment,
                                 annotation_link, annotation_link_title)
        VALUES (?, ?, ?, ?, ?, '', ?, '', 1, ?, ?, ?, ?, ?, '', ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_guid)
    .bind(&fields.create_date)
    .bind(&fields.url)
    .bind(standardize_url_id(&fields.url))
    .bind(&fields.quote)
    .bind(Publisher::Demagog.as_str())
    .bind(publisher_annotation_id)
    .bind(&fields.pp_category)
    .bind(&fields.demagog_category)
    .bind(CheckStatus::Unverified.as_str())
    .bind(&fields.annotation_link)
    .bind(&fields.annotation_link_title)
    .execute(pool)
    .await?;
    Ok(())
}

/// Overwrite the synced fields of an existing annotation
pub async fn update_synced(
    pool: &SqlitePool,
    guid: &str,
    fields: &SyncedFields,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE annotations
        SET url = ?, url_id = ?, quote = ?, pp_category = ?, demagog_category = ?,
            annotation_link = ?, annotation_link_title = ?, create_date = ?
        WHERE guid = ?
        "#,
    )
    .bind(&fields.url)
    .bind(standardize_url_id(&fields.url))
    .bind(&fields.quote)
    .bind(&fields.pp_category)
    .bind(&fields.demagog_category)
    .bind(&fields.annotation_link)
    .bind(&fields.annotation_link_title)
    .bind(&fields.create_date)
    .bind(guid)
    .execute(pool)
    .await?;
    Ok(())
}

/// Whether the stored annotation already matches the statement
pub fn is_unchanged(annotation: &Annotation, fields: &SyncedFields) -> bool {
    annotation.url == fields.url
        && annotation.quote == fields.quote
        && annotation.pp_category == fields.pp_category
        && annotation.demagog_category.as_deref() == Some(fields.demagog_category.as_str())
        && annotation.annotation_link == fields.annotation_link
        && annotation.annotation_link_title == fields.annotation_link_title
        && annotation.create_date == fields.create_date
}
