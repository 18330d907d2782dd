//! Annotation upvote endpoints
//!
//! An upvote is pure linkage: no attributes, one relationship to its
//! annotation. A user can upvote an annotation once; retracting deletes the
//! row.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use pp_common::db::AnnotationUpvote;

use crate::api::auth::CurrentUser;
use crate::db;
use crate::jsonapi::{
    check_resource_type, ApiError, Document, JsonApi, Relationship, RelationshipInput, Resource,
    ResourceIdentifier, TYPE_ANNOTATIONS, TYPE_ANNOTATION_UPVOTES,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UpvoteRelationships {
    pub annotation: Relationship,
}

pub type UpvoteResource = Resource<(), UpvoteRelationships>;

fn upvote_resource(public_host: &str, upvote: AnnotationUpvote) -> UpvoteResource {
    Resource {
        kind: TYPE_ANNOTATION_UPVOTES,
        links: None,
        attributes: None,
        relationships: Some(UpvoteRelationships {
            annotation: Relationship::one(
                Some(format!(
                    "{}/api/annotationUpvotes/{}/annotation",
                    public_host, upvote.guid
                )),
                Some(ResourceIdentifier::new(
                    TYPE_ANNOTATIONS,
                    upvote.annotation_guid,
                )),
            ),
        }),
        id: upvote.guid,
    }
}

#[derive(Debug, Deserialize)]
pub struct UpvotePostBody {
    pub data: Option<UpvotePostData>,
}

#[derive(Debug, Deserialize)]
pub struct UpvotePostData {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub relationships: Option<UpvotePostRelationships>,
}

#[derive(Debug, Deserialize)]
pub struct UpvotePostRelationships {
    pub annotation: Option<RelationshipInput>,
}

/// POST /api/annotationUpvotes
///
/// Duplicate votes and votes on nonexistent annotations both come back as a
/// plain 400 ("Failed to create object") from the integrity checks.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<UpvotePostBody>,
) -> Result<JsonApi<Document<UpvoteResource>>, ApiError> {
    let data = body
        .data
        .ok_or_else(|| ApiError::validation("data", "This field is required."))?;
    check_resource_type(data.kind.as_deref(), TYPE_ANNOTATION_UPVOTES)?;

    let annotation_id = data
        .relationships
        .and_then(|relationships| relationships.annotation)
        .and_then(|relation| relation.id().map(|id| id.to_string()))
        .ok_or_else(|| {
            ApiError::validation("relationships/annotation/data/id", "This field is required.")
        })?;

    let inserted = match db::upvotes::insert(&state.db, &user.guid, &annotation_id).await {
        Ok(Some(upvote)) => upvote,
        Ok(None) => {
            // Unique constraint: the user already upvoted this annotation
            return Err(ApiError::BadRequest(Some("Failed to create object".to_string())));
        }
        Err(e) => {
            let foreign_key = e
                .as_database_error()
                .map(|db_error| db_error.is_foreign_key_violation())
                .unwrap_or(false);
            if foreign_key {
                return Err(ApiError::BadRequest(Some(
                    "Failed to create object".to_string(),
                )));
            }
            return Err(e.into());
        }
    };

    Ok(JsonApi(Document {
        data: upvote_resource(&state.config.server.public_host, inserted),
    }))
}

/// GET /api/annotationUpvotes/:upvote_id
pub async fn get_single(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(upvote_id): Path<String>,
) -> Result<JsonApi<Document<UpvoteResource>>, ApiError> {
    let upvote = db::upvotes::get_for_user(&state.db, &upvote_id, &user.guid)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(JsonApi(Document {
        data: upvote_resource(&state.config.server.public_host, upvote),
    }))
}

/// DELETE /api/annotationUpvotes/:upvote_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(upvote_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let upvote = db::upvotes::get_for_user(&state.db, &upvote_id, &user.guid)
        .await?
        .ok_or(ApiError::NotFound)?;

    db::upvotes::delete(&state.db, &upvote.guid).await?;
    Ok(StatusCode::OK)
}

/// GET /api/annotations/:annotation_id/upvote
///
/// The requesting user's upvote on the annotation, 404 when they haven't
/// voted.
pub async fn annotation_related_upvote(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(annotation_id): Path<String>,
) -> Result<JsonApi<Document<UpvoteResource>>, ApiError> {
    let upvote = db::upvotes::get_by_annotation_and_user(&state.db, &annotation_id, &user.guid)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(JsonApi(Document {
        data: upvote_resource(&state.config.server.public_host, upvote),
    }))
}
