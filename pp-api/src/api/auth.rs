//! Authentication: bearer-token middleware and login endpoints
//!
//! Clients hold a stateless JWT. New installations call the lazy signup
//! endpoint once and get an anonymous identity immediately (no registration
//! step in the extension UI); users may later log in through Google or
//! Facebook, whose access tokens are verified against the provider's
//! userinfo endpoint.

use axum::extract::{Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use pp_common::auth::{issue_token, verify_token};
use pp_common::db::User;

use crate::api::users::user_resource;
use crate::db;
use crate::jsonapi::{ApiError, JsonApi, Resource};
use crate::AppState;

/// The authenticated user, inserted into request extensions by the middleware
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authentication middleware for resource routes
///
/// Expects `Authorization: Bearer <jwt>`; resolves the user and stores it in
/// request extensions. Responds 401 on missing/invalid/expired tokens and on
/// tokens referencing unknown users.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = verify_token(&state.config.auth.secret_key, token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let user = db::users::get(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Login response: the session token plus the user resource
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub data: Resource<serde_json::Value, serde_json::Value>,
}

/// POST /api/auth/lazy
///
/// Create an anonymous user and hand out its session token.
pub async fn lazy_signup(
    State(state): State<AppState>,
) -> Result<JsonApi<LoginResponse>, ApiError> {
    let user = db::users::create_lazy(&state.db).await?;
    let token = issue_token(
        &state.config.auth.secret_key,
        &user.guid,
        state.config.auth.token_ttl_secs,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("Lazy signup: created user {}", user.username);
    Ok(JsonApi(LoginResponse {
        token,
        data: user_resource(&user.guid),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLoginBody {
    pub access_token: Option<String>,
}

/// Userinfo payload shared by the supported providers: Google uses `sub`,
/// Facebook uses `id`
#[derive(Debug, Deserialize)]
struct ProviderUserInfo {
    sub: Option<String>,
    id: Option<String>,
    email: Option<String>,
}

/// POST /api/auth/login/:provider
///
/// Exchange a provider OAuth access token for a session token. The access
/// token is validated by querying the provider's userinfo endpoint.
pub async fn social_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(body): Json<SocialLoginBody>,
) -> Result<JsonApi<LoginResponse>, ApiError> {
    let access_token = body
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("accessToken", "This field is required."))?;

    let userinfo_url = match provider.as_str() {
        "google" => &state.config.auth.google_userinfo_url,
        "facebook" => &state.config.auth.facebook_userinfo_url,
        _ => {
            return Err(ApiError::validation(
                "provider",
                &format!("'{}' is not a supported provider", provider),
            ))
        }
    };

    let info = fetch_userinfo(userinfo_url, &access_token).await?;
    let provider_user_id = info
        .sub
        .or(info.id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Provider returned no user id".to_string()))?;

    let user = db::users::get_or_create_social(
        &state.db,
        &provider,
        &provider_user_id,
        info.email.as_deref(),
    )
    .await?;

    let token = issue_token(
        &state.config.auth.secret_key,
        &user.guid,
        state.config.auth.token_ttl_secs,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("Social login via {}: user {}", provider, user.username);
    Ok(JsonApi(LoginResponse {
        token,
        data: user_resource(&user.guid),
    }))
}

/// Validate the access token by fetching the provider's userinfo document
async fn fetch_userinfo(userinfo_url: &str, access_token: &str) -> Result<ProviderUserInfo, ApiError> {
    let client = reqwest::Client::new();
    let response = client
        .get(userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("userinfo request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(ApiError::Unauthorized(
            "Access token rejected by provider".to_string(),
        ));
    }

    response
        .json::<ProviderUserInfo>()
        .await
        .map_err(|e| ApiError::Internal(format!("malformed userinfo response: {}", e)))
}
