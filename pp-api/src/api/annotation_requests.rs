//! Annotation request endpoints
//!
//! Readers ask for a fact-check on a page. The editors' postbox is notified
//! for every request; readers who leave an address get mailed back when an
//! annotation appears, with a signed unsubscribe link.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use pp_common::db::AnnotationRequest;

use crate::api::auth::CurrentUser;
use crate::db;
use crate::jsonapi::{
    check_resource_type, ApiError, Document, JsonApi, Resource, TYPE_ANNOTATION_REQUESTS,
};
use crate::mail::notifications;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAttributes {
    pub url: String,
    pub quote: String,
    pub comment: String,
    pub notification_email: String,
    pub create_date: String,
}

pub type RequestResource = Resource<RequestAttributes, ()>;

fn request_resource(request: AnnotationRequest) -> RequestResource {
    Resource {
        kind: TYPE_ANNOTATION_REQUESTS,
        links: None,
        attributes: Some(RequestAttributes {
            url: pp_common::urlnorm::standardize_url(&request.url),
            quote: request.quote,
            comment: request.comment,
            notification_email: request.notification_email,
            create_date: request.create_date,
        }),
        relationships: None,
        id: request.guid,
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestPostBody {
    pub data: Option<RequestPostData>,
}

#[derive(Debug, Deserialize)]
pub struct RequestPostData {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub attributes: Option<RequestPostAttributes>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPostAttributes {
    pub url: Option<String>,
    pub quote: Option<String>,
    pub comment: Option<String>,
    pub notification_email: Option<String>,
}

/// POST /api/annotationRequests
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<RequestPostBody>,
) -> Result<JsonApi<Document<RequestResource>>, ApiError> {
    let data = body
        .data
        .ok_or_else(|| ApiError::validation("data", "This field is required."))?;
    check_resource_type(data.kind.as_deref(), TYPE_ANNOTATION_REQUESTS)?;
    let attributes = data.attributes.unwrap_or_default();

    let url = attributes
        .url
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::validation("attributes/url", "This field is required."))?;

    let notification_email = attributes.notification_email.unwrap_or_default();
    if !notification_email.is_empty() && !notification_email.contains('@') {
        return Err(ApiError::validation(
            "attributes/notificationEmail",
            "Enter a valid email address.",
        ));
    }

    let request = db::requests::insert(
        &state.db,
        &user.guid,
        &url,
        &attributes.quote.unwrap_or_default(),
        &attributes.comment.unwrap_or_default(),
        &notification_email,
    )
    .await?;

    // Failure to reach the postbox never fails the request itself
    notifications::notify_editors_about_request(&state.mailer, &state.config, &request).await;

    Ok(JsonApi(Document {
        data: request_resource(request),
    }))
}

/// GET /api/annotationRequests/:request_id/unsubscribe/:token
///
/// Public endpoint hit from the notification mail. The token binds the link
/// to one request; a bad token behaves like a missing resource.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path((request_id, token)): Path<(String, String)>,
) -> Result<JsonApi<Document<Value>>, ApiError> {
    let request = db::requests::get(&state.db, &request_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if !notifications::verify_unsubscribe_token(
        &state.config.auth.secret_key,
        &request.guid,
        &token,
    ) {
        return Err(ApiError::NotFound);
    }

    db::requests::clear_notification_email(&state.db, &request.guid).await?;
    info!("Unsubscribed annotation request {}", request.guid);

    Ok(JsonApi(Document { data: Value::Null }))
}
