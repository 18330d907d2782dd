//! Annotation endpoints
//!
//! The core resource of the service. Reads are scoped to active annotations;
//! writes are owner-only, and deletion only flips the active flag. Creating
//! an annotation notifies subscribers who asked for one on the same page.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pp_common::consts::{DemagogCategory, PpCategory, Publisher};
use pp_common::db::{Annotation, AnnotationReport, AnnotationUpvote};
use pp_common::urlnorm::standardize_url;

use crate::api::auth::CurrentUser;
use crate::db;
use crate::db::annotations::{AnnotationFilter, AnnotationPatch, NewAnnotation};
use crate::filters::{parse_check_statuses, parse_ordering, resolve_url_filter};
use crate::jsonapi::{
    ApiError, Document, ErrorObject, ErrorSource, JsonApi, ListDocument, Relationship,
    RelationshipInput, Resource, ResourceIdentifier, SelfLinks, TYPE_ANNOTATIONS,
    TYPE_ANNOTATION_REPORTS, TYPE_ANNOTATION_REQUESTS, TYPE_ANNOTATION_UPVOTES, TYPE_USERS,
};
use crate::mail::notifications;
use crate::pagination::Page;
use crate::AppState;

// ========================================
// Resource serialization
// ========================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationAttributes {
    pub url: String,
    pub range: Value,
    pub quote: String,
    pub quote_context: String,
    pub publisher: String,
    pub pp_category: String,
    pub demagog_category: Option<String>,
    pub comment: String,
    pub annotation_link: String,
    pub annotation_link_title: String,
    pub create_date: String,
    pub upvote_count_except_user: i64,
    pub does_belong_to_user: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRelationships {
    pub user: Relationship,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation_request: Option<Relationship>,
    pub annotation_upvote: Relationship,
    pub annotation_reports: Relationship,
}

pub type AnnotationResource = Resource<AnnotationAttributes, AnnotationRelationships>;

/// Per-user context needed to serialize an annotation
struct AnnotationView {
    annotation: Annotation,
    upvote: Option<AnnotationUpvote>,
    reports: Vec<AnnotationReport>,
    upvote_count_except_user: i64,
    does_belong_to_user: bool,
}

fn annotation_resource(public_host: &str, view: AnnotationView) -> AnnotationResource {
    let annotation = view.annotation;

    // `range` is stored as a JSON blob; empty means "no range given"
    let range = if annotation.range.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&annotation.range).unwrap_or(Value::Null)
    };

    let relationships = AnnotationRelationships {
        user: Relationship::one(
            Some(format!(
                "{}/api/annotations/{}/user",
                public_host, annotation.guid
            )),
            Some(ResourceIdentifier::new(
                TYPE_USERS,
                annotation.user_guid.clone(),
            )),
        ),
        annotation_request: annotation.annotation_request_guid.as_ref().map(|guid| {
            Relationship::one(
                None,
                Some(ResourceIdentifier::new(
                    TYPE_ANNOTATION_REQUESTS,
                    guid.clone(),
                )),
            )
        }),
        annotation_upvote: Relationship::one(
            Some(format!(
                "{}/api/annotations/{}/upvote",
                public_host, annotation.guid
            )),
            view.upvote
                .map(|upvote| ResourceIdentifier::new(TYPE_ANNOTATION_UPVOTES, upvote.guid)),
        ),
        annotation_reports: Relationship::many(
            Some(format!(
                "{}/api/annotations/{}/reports",
                public_host, annotation.guid
            )),
            view.reports
                .into_iter()
                .map(|report| ResourceIdentifier::new(TYPE_ANNOTATION_REPORTS, report.guid))
                .collect(),
        ),
    };

    Resource {
        links: Some(SelfLinks {
            self_link: format!("{}/api/annotations/{}", public_host, annotation.guid),
        }),
        id: annotation.guid,
        kind: TYPE_ANNOTATIONS,
        attributes: Some(AnnotationAttributes {
            url: standardize_url(&annotation.url),
            range,
            quote: annotation.quote,
            quote_context: annotation.quote_context,
            publisher: annotation.publisher,
            pp_category: annotation.pp_category,
            demagog_category: annotation.demagog_category,
            comment: annotation.comment,
            annotation_link: annotation.annotation_link,
            annotation_link_title: annotation.annotation_link_title,
            create_date: annotation.create_date,
            upvote_count_except_user: view.upvote_count_except_user,
            does_belong_to_user: view.does_belong_to_user,
        }),
        relationships: Some(relationships),
    }
}

/// Load the requesting user's view of a single annotation
async fn load_view(
    state: &AppState,
    annotation: Annotation,
    user_guid: &str,
) -> Result<AnnotationView, ApiError> {
    let upvote =
        db::upvotes::get_by_annotation_and_user(&state.db, &annotation.guid, user_guid).await?;
    let reports =
        db::reports::list_for_annotation_and_user(&state.db, &annotation.guid, user_guid).await?;
    let upvote_count_except_user =
        db::annotations::upvote_count_except_user(&state.db, &annotation.guid, user_guid).await?;

    Ok(AnnotationView {
        does_belong_to_user: annotation.user_guid == user_guid,
        annotation,
        upvote,
        reports,
        upvote_count_except_user,
    })
}

// ========================================
// Single resource
// ========================================

/// GET /api/annotations/:annotation_id
pub async fn get_single(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(annotation_id): Path<String>,
) -> Result<JsonApi<Document<AnnotationResource>>, ApiError> {
    let annotation = db::annotations::get_active(&state.db, &annotation_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let view = load_view(&state, annotation, &user.guid).await?;
    Ok(JsonApi(Document {
        data: annotation_resource(&state.config.server.public_host, view),
    }))
}

/// GET /api/annotationUpvotes/:upvote_id/annotation
pub async fn upvote_related_annotation(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(upvote_id): Path<String>,
) -> Result<JsonApi<Document<AnnotationResource>>, ApiError> {
    let annotation = db::annotations::get_active_by_upvote(&state.db, &upvote_id, &user.guid)
        .await?
        .ok_or(ApiError::NotFound)?;

    let view = load_view(&state, annotation, &user.guid).await?;
    Ok(JsonApi(Document {
        data: annotation_resource(&state.config.server.public_host, view),
    }))
}

/// GET /api/annotationReports/:report_id/annotation
pub async fn report_related_annotation(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(report_id): Path<String>,
) -> Result<JsonApi<Document<AnnotationResource>>, ApiError> {
    let annotation = db::annotations::get_active_by_report(&state.db, &report_id, &user.guid)
        .await?
        .ok_or(ApiError::NotFound)?;

    let view = load_view(&state, annotation, &user.guid).await?;
    Ok(JsonApi(Document {
        data: annotation_resource(&state.config.server.public_host, view),
    }))
}

// ========================================
// List
// ========================================

#[derive(Debug, Deserialize)]
pub struct AnnotationListQuery {
    pub url: Option<String>,
    pub check_status: Option<String>,
    pub ordering: Option<String>,
    #[serde(rename = "page[limit]")]
    pub page_limit: Option<i64>,
    #[serde(rename = "page[offset]")]
    pub page_offset: Option<i64>,
}

/// GET /api/annotations
///
/// Active annotations, optionally filtered to one page URL (query param or
/// `PP-SITE-URL` header) and by check status, newest first by default.
pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    headers: HeaderMap,
    Query(query): Query<AnnotationListQuery>,
) -> Result<JsonApi<ListDocument<AnnotationResource>>, ApiError> {
    let filter = AnnotationFilter {
        url_id: resolve_url_filter(&headers, query.url.as_deref())?,
        check_statuses: parse_check_statuses(query.check_status.as_deref())?,
    };
    let order_sql = parse_ordering(query.ordering.as_deref())?;
    let page = Page::new(query.page_limit, query.page_offset);

    let total = db::annotations::count(&state.db, &filter).await?;
    let annotations =
        db::annotations::list(&state.db, &filter, order_sql, page.limit, page.offset).await?;

    // Batch the per-user context for the whole page
    let guids: Vec<String> = annotations.iter().map(|a| a.guid.clone()).collect();
    let mut upvotes =
        db::upvotes::by_user_for_annotations(&state.db, &user.guid, &guids).await?;
    let mut reports =
        db::reports::by_user_for_annotations(&state.db, &user.guid, &guids).await?;
    let counts =
        db::annotations::upvote_counts_except_user(&state.db, &guids, &user.guid).await?;

    let public_host = state.config.server.public_host.clone();
    let data = annotations
        .into_iter()
        .map(|annotation| {
            let view = AnnotationView {
                upvote: upvotes.remove(&annotation.guid),
                reports: reports.remove(&annotation.guid).unwrap_or_default(),
                upvote_count_except_user: counts.get(&annotation.guid).copied().unwrap_or(0),
                does_belong_to_user: annotation.user_guid == user.guid,
                annotation,
            };
            annotation_resource(&public_host, view)
        })
        .collect();

    Ok(JsonApi(ListDocument {
        links: page.links("/api/annotations", total),
        data,
        meta: page.meta(total),
    }))
}

// ========================================
// Create
// ========================================

#[derive(Debug, Deserialize)]
pub struct AnnotationPostBody {
    pub data: Option<AnnotationPostData>,
}

#[derive(Debug, Deserialize)]
pub struct AnnotationPostData {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub attributes: Option<AnnotationPostAttributes>,
    pub relationships: Option<AnnotationPostRelationships>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPostAttributes {
    pub url: Option<String>,
    pub range: Option<Value>,
    pub quote: Option<String>,
    pub quote_context: Option<String>,
    pub pp_category: Option<String>,
    pub demagog_category: Option<String>,
    pub comment: Option<String>,
    pub annotation_link: Option<String>,
    pub annotation_link_title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPostRelationships {
    pub annotation_request: Option<RelationshipInput>,
}

fn field_error(pointer: &str, details: &str) -> ErrorObject {
    ErrorObject {
        title: None,
        details: details.to_string(),
        source: Some(ErrorSource {
            pointer: pointer.to_string(),
        }),
    }
}

/// Validate a POST body into the insertable record
fn validate_post_body(
    body: AnnotationPostBody,
    user_guid: &str,
) -> Result<(NewAnnotation, Option<RelationshipInput>), Vec<ErrorObject>> {
    let mut errors = Vec::new();

    let data = match body.data {
        Some(data) => data,
        None => return Err(vec![field_error("data", "This field is required.")]),
    };
    if let Some(kind) = &data.kind {
        if kind != TYPE_ANNOTATIONS {
            errors.push(field_error(
                "type",
                &format!("value '{}' is not equal to constant value 'annotations'", kind),
            ));
        }
    }
    let attributes = data.attributes.unwrap_or_default();

    let url = match attributes.url.filter(|v| !v.is_empty()) {
        Some(url) => url,
        None => {
            errors.push(field_error("attributes/url", "This field is required."));
            String::new()
        }
    };
    let quote = match attributes.quote.filter(|v| !v.is_empty()) {
        Some(quote) => quote,
        None => {
            errors.push(field_error("attributes/quote", "This field is required."));
            String::new()
        }
    };
    let pp_category = match attributes.pp_category.as_deref() {
        Some(code) if PpCategory::from_str(code).is_some() => code.to_string(),
        Some(code) => {
            errors.push(field_error(
                "attributes/ppCategory",
                &format!("'{}' is not a valid choice", code),
            ));
            String::new()
        }
        None => {
            errors.push(field_error("attributes/ppCategory", "This field is required."));
            String::new()
        }
    };
    let demagog_category = match attributes.demagog_category.filter(|v| !v.is_empty()) {
        Some(code) => match DemagogCategory::from_str(&code) {
            Some(category) => Some(category.as_str().to_string()),
            None => {
                errors.push(field_error(
                    "attributes/demagogCategory",
                    &format!("'{}' is not a valid choice", code),
                ));
                None
            }
        },
        None => None,
    };
    let annotation_link = match attributes.annotation_link.filter(|v| !v.is_empty()) {
        Some(link) => link,
        None => {
            errors.push(field_error(
                "attributes/annotationLink",
                "This field is required.",
            ));
            String::new()
        }
    };
    let annotation_link_title = match attributes.annotation_link_title.filter(|v| !v.is_empty()) {
        Some(title) => title,
        None => {
            errors.push(field_error(
                "attributes/annotationLinkTitle",
                "This field is required.",
            ));
            String::new()
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    let range = attributes
        .range
        .map(|value| value.to_string())
        .unwrap_or_default();

    let new = NewAnnotation {
        user_guid: user_guid.to_string(),
        url,
        range,
        quote,
        quote_context: attributes.quote_context.unwrap_or_default(),
        publisher: Publisher::Pp.as_str().to_string(),
        publisher_annotation_id: None,
        pp_category,
        demagog_category,
        comment: attributes.comment.unwrap_or_default(),
        annotation_link,
        annotation_link_title,
        annotation_request_guid: None,
        create_date: None,
    };

    let request_relation = data
        .relationships
        .and_then(|relationships| relationships.annotation_request);

    Ok((new, request_relation))
}

/// POST /api/annotations
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<AnnotationPostBody>,
) -> Result<JsonApi<Document<AnnotationResource>>, ApiError> {
    let (mut new, request_relation) =
        validate_post_body(body, &user.guid).map_err(ApiError::Validation)?;

    // Tie to the originating request when the client references one
    if let Some(request_id) = request_relation.as_ref().and_then(|rel| rel.id()) {
        match db::requests::get(&state.db, request_id).await? {
            Some(request) => new.annotation_request_guid = Some(request.guid),
            None => {
                return Err(ApiError::validation(
                    "relationships/annotationRequest/data/id",
                    "Annotation request does not exist",
                ))
            }
        }
    }

    let annotation = db::annotations::insert(&state.db, new).await?;

    // Everyone who asked for an annotation on this page gets a mail
    let subscribers =
        db::requests::subscribers_for_url_id(&state.db, &annotation.url_id).await?;
    notifications::notify_request_subscribers(
        &state.mailer,
        &state.config,
        &annotation.url,
        &subscribers,
    )
    .await;

    let view = load_view(&state, annotation, &user.guid).await?;
    Ok(JsonApi(Document {
        data: annotation_resource(&state.config.server.public_host, view),
    }))
}

// ========================================
// Patch
// ========================================

/// PATCH /api/annotations/:annotation_id
///
/// Owner-only; only the editorial fields may change. Any `relationships`
/// member in the payload is rejected.
pub async fn patch(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(annotation_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<JsonApi<Document<AnnotationResource>>, ApiError> {
    let annotation = db::annotations::get_active(&state.db, &annotation_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if annotation.user_guid != user.guid {
        return Err(ApiError::PermissionDenied);
    }

    let data = body.get("data").cloned().unwrap_or(Value::Null);
    if data.get("relationships").is_some() {
        return Err(ApiError::Forbidden(
            "Updating relationships not supported".to_string(),
        ));
    }

    let attributes = data.get("attributes").cloned().unwrap_or(Value::Null);
    let patch = parse_patch(&attributes)?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest(None));
    }

    db::annotations::update(&state.db, &annotation.guid, &patch).await?;

    let annotation = db::annotations::get_active(&state.db, &annotation.guid)
        .await?
        .ok_or(ApiError::NotFound)?;
    let view = load_view(&state, annotation, &user.guid).await?;
    Ok(JsonApi(Document {
        data: annotation_resource(&state.config.server.public_host, view),
    }))
}

/// Extract the patchable subset of attributes, ignoring everything else
fn parse_patch(attributes: &Value) -> Result<AnnotationPatch, ApiError> {
    let get_string = |key: &str| -> Option<String> {
        attributes
            .get(key)
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
    };

    let patch = AnnotationPatch {
        pp_category: get_string("ppCategory"),
        comment: get_string("comment"),
        annotation_link: get_string("annotationLink"),
        annotation_link_title: get_string("annotationLinkTitle"),
    };

    if let Some(code) = &patch.pp_category {
        if PpCategory::from_str(code).is_none() {
            return Err(ApiError::validation(
                "attributes/ppCategory",
                &format!("'{}' is not a valid choice", code),
            ));
        }
    }

    Ok(patch)
}

// ========================================
// Delete
// ========================================

/// DELETE /api/annotations/:annotation_id
///
/// Owner-only soft delete; repeating the call is a no-op.
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(annotation_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let annotation = db::annotations::get(&state.db, &annotation_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if annotation.user_guid != user.guid {
        return Err(ApiError::PermissionDenied);
    }

    if annotation.active {
        db::annotations::soft_delete(&state.db, &annotation.guid).await?;
    }
    Ok(StatusCode::OK)
}
