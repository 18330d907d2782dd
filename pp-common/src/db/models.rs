//! Database models
//!
//! Guids and timestamps are stored as TEXT (UUIDv4 strings, RFC 3339).
//! Enum-coded columns hold the wire codes from [`crate::consts`]; they are
//! validated at the API/sync boundaries and pass through here as strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub guid: String,
    pub username: String,
    pub email: Option<String>,
    pub provider: Option<String>,
    pub provider_user_id: Option<String>,
    pub create_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Annotation {
    pub guid: String,
    pub user_guid: String,
    pub create_date: String,

    /// URL the annotation has been made on
    pub url: String,
    /// Standardized scheme-less form of `url`; recomputed whenever `url` changes
    pub url_id: String,
    /// JSON blob locating the annotation within the page
    pub range: String,
    /// The exact annotated text part
    pub quote: String,
    /// The annotated text with its surroundings
    pub quote_context: String,

    /// Rows are never deleted, only deactivated
    pub active: bool,

    pub publisher: String,
    /// Identifier at the external publisher; None for user-created annotations
    pub publisher_annotation_id: Option<String>,
    pub pp_category: String,
    pub demagog_category: Option<String>,
    pub check_status: Option<String>,
    pub comment: String,

    /// Hyperlink to the source backing the annotation
    pub annotation_link: String,
    /// Short summary of the page referred to
    pub annotation_link_title: String,

    /// Set when the annotation was created in response to a request
    pub annotation_request_guid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnnotationUpvote {
    pub guid: String,
    pub user_guid: String,
    pub annotation_guid: String,
    pub create_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnnotationReport {
    pub guid: String,
    pub user_guid: String,
    pub annotation_guid: String,
    pub create_date: String,
    pub reason: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnnotationRequest {
    pub guid: String,
    pub user_guid: String,
    pub create_date: String,
    pub url: String,
    pub url_id: String,
    pub quote: String,
    pub comment: String,
    /// Subscribers get mailed when an annotation appears on the page;
    /// cleared via the signed unsubscribe link
    pub notification_email: String,
    pub active: bool,
}
