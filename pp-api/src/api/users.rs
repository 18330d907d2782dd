//! User endpoints
//!
//! User resources deliberately expose no attributes: the extension only
//! needs stable ids to recognize annotation ownership.

use axum::extract::{Path, State};
use axum::Extension;
use serde_json::json;

use crate::api::auth::CurrentUser;
use crate::db;
use crate::jsonapi::{ApiError, Document, JsonApi, Resource, TYPE_USERS};
use crate::AppState;

/// Build a user resource (empty attributes object)
pub fn user_resource(user_guid: &str) -> Resource<serde_json::Value, serde_json::Value> {
    Resource {
        id: user_guid.to_string(),
        kind: TYPE_USERS,
        links: None,
        attributes: Some(json!({})),
        relationships: None,
    }
}

/// GET /api/users/:user_id
pub async fn get_single(
    State(state): State<AppState>,
    Extension(CurrentUser(_user)): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> Result<JsonApi<Document<Resource<serde_json::Value, serde_json::Value>>>, ApiError> {
    let user = db::users::get(&state.db, &user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(JsonApi(Document {
        data: user_resource(&user.guid),
    }))
}

/// GET /api/annotations/:annotation_id/user
///
/// Author of an active annotation.
pub async fn annotation_related_user(
    State(state): State<AppState>,
    Extension(CurrentUser(_user)): Extension<CurrentUser>,
    Path(annotation_id): Path<String>,
) -> Result<JsonApi<Document<Resource<serde_json::Value, serde_json::Value>>>, ApiError> {
    let user = db::users::get_by_annotation(&state.db, &annotation_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(JsonApi(Document {
        data: user_resource(&user.guid),
    }))
}
