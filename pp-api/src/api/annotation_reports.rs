//! Annotation report endpoints
//!
//! Reports flag problematic annotations to moderators. Users only ever see
//! their own reports.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use pp_common::consts::ReportReason;
use pp_common::db::AnnotationReport;

use crate::api::auth::CurrentUser;
use crate::db;
use crate::jsonapi::{
    check_resource_type, ApiError, Document, JsonApi, Relationship, RelationshipInput, Resource,
    ResourceIdentifier, TYPE_ANNOTATIONS, TYPE_ANNOTATION_REPORTS,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReportAttributes {
    pub reason: String,
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct ReportRelationships {
    pub annotation: Relationship,
}

pub type ReportResource = Resource<ReportAttributes, ReportRelationships>;

fn report_resource(report: AnnotationReport) -> ReportResource {
    Resource {
        kind: TYPE_ANNOTATION_REPORTS,
        links: None,
        attributes: Some(ReportAttributes {
            reason: report.reason,
            comment: report.comment,
        }),
        relationships: Some(ReportRelationships {
            annotation: Relationship::one(
                None,
                Some(ResourceIdentifier::new(
                    TYPE_ANNOTATIONS,
                    report.annotation_guid,
                )),
            ),
        }),
        id: report.guid,
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportPostBody {
    pub data: Option<ReportPostData>,
}

#[derive(Debug, Deserialize)]
pub struct ReportPostData {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub attributes: Option<ReportPostAttributes>,
    pub relationships: Option<ReportPostRelationships>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportPostAttributes {
    pub reason: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportPostRelationships {
    pub annotation: Option<RelationshipInput>,
}

/// POST /api/annotationReports
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<ReportPostBody>,
) -> Result<JsonApi<Document<ReportResource>>, ApiError> {
    let data = body
        .data
        .ok_or_else(|| ApiError::validation("data", "This field is required."))?;
    check_resource_type(data.kind.as_deref(), TYPE_ANNOTATION_REPORTS)?;
    let attributes = data.attributes.unwrap_or_default();

    let reason = match attributes.reason.as_deref() {
        Some(code) if ReportReason::from_str(code).is_some() => code.to_string(),
        Some(code) => {
            return Err(ApiError::validation(
                "attributes/reason",
                &format!("'{}' is not a valid choice", code),
            ))
        }
        None => {
            return Err(ApiError::validation(
                "attributes/reason",
                "This field is required.",
            ))
        }
    };
    let comment = attributes.comment.unwrap_or_default();

    // A suggested correction without the correction text is useless
    if reason == ReportReason::SuggestedCorrection.as_str() && comment.is_empty() {
        return Err(ApiError::validation(
            "attributes/comment",
            "Comment is required for report 'SUGGESTED_CORRECTION' reason",
        ));
    }

    let annotation_id = data
        .relationships
        .and_then(|relationships| relationships.annotation)
        .and_then(|relation| relation.id().map(|id| id.to_string()))
        .ok_or_else(|| {
            ApiError::validation("relationships/annotation/data/id", "This field is required.")
        })?;

    // Only active annotations can be reported
    db::annotations::get_active(&state.db, &annotation_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let report =
        db::reports::insert(&state.db, &user.guid, &annotation_id, &reason, &comment).await?;

    Ok(JsonApi(Document {
        data: report_resource(report),
    }))
}

/// GET /api/annotationReports/:report_id
pub async fn get_single(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(report_id): Path<String>,
) -> Result<JsonApi<Document<ReportResource>>, ApiError> {
    let report = db::reports::get_for_user(&state.db, &report_id, &user.guid)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(JsonApi(Document {
        data: report_resource(report),
    }))
}

/// GET /api/annotations/:annotation_id/reports
///
/// The requesting user's reports against an active annotation, as a bare
/// resource array (this is a related-link target, not a top-level
/// collection).
pub async fn annotation_related_reports(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(annotation_id): Path<String>,
) -> Result<JsonApi<Vec<ReportResource>>, ApiError> {
    db::annotations::get_active(&state.db, &annotation_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let reports =
        db::reports::list_for_annotation_and_user(&state.db, &annotation_id, &user.guid).await?;

    Ok(JsonApi(reports.into_iter().map(report_resource).collect()))
}
