//! JSON:API envelope types and error responses
//!
//! The extension speaks a JSON:API dialect: resources are
//! `{id, type, attributes, relationships, links}` objects wrapped in a
//! `data` document, attribute keys are camelCased, and errors come back as
//! `{"errors": [...]}` objects. User-caused errors are answered with 400,
//! ownership violations with 403, missing resources with 404.

use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Content type of every JSON:API response
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Resource type names (camelCased on the wire)
pub const TYPE_ANNOTATIONS: &str = "annotations";
pub const TYPE_ANNOTATION_UPVOTES: &str = "annotationUpvotes";
pub const TYPE_ANNOTATION_REPORTS: &str = "annotationReports";
pub const TYPE_ANNOTATION_REQUESTS: &str = "annotationRequests";
pub const TYPE_USERS: &str = "users";

/// `{type, id}` pair referencing a resource
#[derive(Debug, Clone, Serialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedLinks {
    pub related: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfLinks {
    #[serde(rename = "self")]
    pub self_link: String,
}

/// Relationship member: optional related link plus linkage data
#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<RelatedLinks>,
    pub data: RelationshipData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RelationshipData {
    One(Option<ResourceIdentifier>),
    Many(Vec<ResourceIdentifier>),
}

impl Relationship {
    /// To-one relationship (`data` is an identifier or null)
    pub fn one(related: Option<String>, target: Option<ResourceIdentifier>) -> Self {
        Self {
            links: related.map(|related| RelatedLinks { related }),
            data: RelationshipData::One(target),
        }
    }

    /// To-many relationship (`data` is an identifier array)
    pub fn many(related: Option<String>, targets: Vec<ResourceIdentifier>) -> Self {
        Self {
            links: related.map(|related| RelatedLinks { related }),
            data: RelationshipData::Many(targets),
        }
    }
}

/// A JSON:API resource object
#[derive(Debug, Serialize)]
pub struct Resource<A: Serialize, R: Serialize> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<SelfLinks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<A>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<R>,
}

/// Single-resource document: `{"data": ...}`
#[derive(Debug, Serialize)]
pub struct Document<T: Serialize> {
    pub data: T,
}

/// List document with pagination links and meta
#[derive(Debug, Serialize)]
pub struct ListDocument<T: Serialize> {
    pub links: crate::pagination::PageLinks,
    pub data: Vec<T>,
    pub meta: crate::pagination::ListMeta,
}

/// Response wrapper stamping the JSON:API content type
pub struct JsonApi<T>(pub T);

impl<T: Serialize> IntoResponse for JsonApi<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        response
    }
}

/// Incoming relationship member: `{"data": {"type": ..., "id": ...}}`
#[derive(Debug, Deserialize)]
pub struct RelationshipInput {
    pub data: Option<ResourceIdentifierInput>,
}

impl RelationshipInput {
    /// The referenced resource id, when the linkage carries one
    pub fn id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|identifier| identifier.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Incoming `{type, id}` pair; only the id is acted upon
#[derive(Debug, Deserialize)]
pub struct ResourceIdentifierInput {
    pub id: Option<String>,
}

/// Validate the document's `type` member against the expected resource type
pub fn check_resource_type(kind: Option<&str>, expected: &'static str) -> Result<(), ApiError> {
    match kind {
        Some(kind) if kind != expected => Err(ApiError::validation(
            "type",
            &format!(
                "value '{}' is not equal to constant value '{}'",
                kind, expected
            ),
        )),
        _ => Ok(()),
    }
}

/// One entry of the `errors` array
#[derive(Debug, Clone, Serialize)]
pub struct ErrorObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorSource {
    /// Path into the failing document member, e.g. `attributes/url`
    pub pointer: String,
}

/// API error responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 with per-field pointer errors
    Validation(Vec<ErrorObject>),
    /// 400 with a bare details message (empty message: empty errors array)
    BadRequest(Option<String>),
    /// 401, token missing/invalid/expired
    Unauthorized(String),
    /// 403, resource owned by someone else
    PermissionDenied,
    /// 403 with details (unsupported operation)
    Forbidden(String),
    /// 404
    NotFound,
    /// 500, logged and answered without internals
    Internal(String),
}

impl ApiError {
    /// Single-field validation error
    pub fn validation(pointer: &str, details: &str) -> Self {
        ApiError::Validation(vec![ErrorObject {
            title: None,
            details: details.to_string(),
            source: Some(ErrorSource {
                pointer: pointer.to_string(),
            }),
        }])
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(format!("database error: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, errors),
            ApiError::BadRequest(details) => (
                StatusCode::BAD_REQUEST,
                details
                    .map(|details| {
                        vec![ErrorObject {
                            title: None,
                            details,
                            source: None,
                        }]
                    })
                    .unwrap_or_default(),
            ),
            ApiError::Unauthorized(details) => (
                StatusCode::UNAUTHORIZED,
                vec![ErrorObject {
                    title: Some("Unauthorized".to_string()),
                    details,
                    source: None,
                }],
            ),
            ApiError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                vec![ErrorObject {
                    title: Some("Permission Denied".to_string()),
                    details: "No details provided".to_string(),
                    source: None,
                }],
            ),
            ApiError::Forbidden(details) => (
                StatusCode::FORBIDDEN,
                vec![ErrorObject {
                    title: Some("Forbidden".to_string()),
                    details,
                    source: None,
                }],
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                vec![ErrorObject {
                    title: Some("Resource not found".to_string()),
                    details: "No details provided".to_string(),
                    source: None,
                }],
            ),
            ApiError::Internal(details) => {
                error!("Internal error: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![ErrorObject {
                        title: Some("Internal error".to_string()),
                        details: "No details provided".to_string(),
                        source: None,
                    }],
                )
            }
        };

        let body = serde_json::json!({ "errors": errors });
        let mut response = (status, Json(body)).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        response
    }
}
