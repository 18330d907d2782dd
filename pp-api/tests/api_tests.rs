//! Integration tests for pp-api endpoints
//!
//! Tests drive the full router over an in-memory database:
//! - lazy signup and bearer-token authentication
//! - annotation CRUD (ownership, soft delete, validation)
//! - URL filtering via query param and PP-SITE-URL header
//! - upvote and report flows
//! - annotation requests and the unsubscribe link

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

use pp_api::mail::notifications::unsubscribe_token;
use pp_api::{build_router, AppState};
use pp_common::config::Config;

/// Test helper: build the app over a fresh in-memory database
async fn setup() -> (axum::Router, AppState) {
    let pool = pp_common::db::init_memory_database()
        .await
        .expect("Should create in-memory database");
    let state = AppState::new(pool, Config::default());
    (build_router(state.clone()), state)
}

/// Test helper: build a request with optional bearer token and JSON body
fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: lazy signup, returning (token, user id)
async fn signup(app: &axum::Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(request("POST", "/api/auth/lazy", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["data"]["id"].as_str().unwrap().to_string(),
    )
}

fn annotation_payload(url: &str) -> Value {
    json!({
        "data": {
            "type": "annotations",
            "attributes": {
                "url": url,
                "range": {"start": "Od tad", "end": "do tad"},
                "quote": "very nice",
                "quoteContext": "it is indeed very nice and smooth",
                "ppCategory": "ADDITIONAL_INFO",
                "comment": "komentarz",
                "annotationLink": "http://www.przypispowszechny.com/",
                "annotationLinkTitle": "very nice too"
            }
        }
    })
}

/// Test helper: create an annotation, returning its resource object
async fn post_annotation(app: &axum::Router, token: &str, url: &str) -> Value {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/annotations",
            Some(token),
            Some(annotation_payload(url)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    extract_json(response.into_body()).await["data"].clone()
}

// =============================================================================
// Health & authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (app, _state) = setup().await;

    let response = app
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "pp-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_resource_routes_require_token() {
    let (app, _state) = setup().await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/annotations", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request("GET", "/api/annotations", Some("garbage"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_lazy_signup_creates_usable_identity() {
    let (app, _state) = setup().await;
    let (token, user_id) = signup(&app).await;

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/users/{}", user_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body,
        json!({"data": {"id": user_id, "type": "users", "attributes": {}}})
    );
}

#[tokio::test]
async fn test_social_login_against_stub_provider() {
    // Fake userinfo endpoint standing in for Google
    let stub = axum::Router::new().route(
        "/userinfo",
        axum::routing::get(|| async {
            axum::Json(json!({"sub": "google-user-123", "email": "reader@example.com"}))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });

    let pool = pp_common::db::init_memory_database().await.unwrap();
    let mut config = Config::default();
    config.auth.google_userinfo_url = format!("http://{}/userinfo", addr);
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let login = |app: axum::Router| async move {
        let response = app
            .oneshot(request(
                "POST",
                "/api/auth/login/google",
                None,
                Some(json!({"accessToken": "valid-token"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        extract_json(response.into_body()).await
    };

    let first = login(app.clone()).await;
    assert!(first["token"].is_string());
    let user_id = first["data"]["id"].as_str().unwrap().to_string();

    // Logging in again resolves to the same user
    let second = login(app.clone()).await;
    assert_eq!(second["data"]["id"], user_id.as_str());

    // Unknown providers are a validation error
    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/login/twitter",
            None,
            Some(json!({"accessToken": "valid-token"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Annotation create & single
// =============================================================================

#[tokio::test]
async fn test_post_annotation_returns_resource() {
    let (app, _state) = setup().await;
    let (token, user_id) = signup(&app).await;

    let data = post_annotation(&app, &token, "http://www.przypis.pl/").await;

    assert_eq!(data["type"], "annotations");
    assert!(data["id"].is_string());

    let attributes = &data["attributes"];
    assert_eq!(attributes["url"], "http://www.przypis.pl/");
    assert_eq!(attributes["range"], json!({"start": "Od tad", "end": "do tad"}));
    assert_eq!(attributes["quote"], "very nice");
    assert_eq!(attributes["quoteContext"], "it is indeed very nice and smooth");
    assert_eq!(attributes["publisher"], "PP");
    assert_eq!(attributes["ppCategory"], "ADDITIONAL_INFO");
    assert_eq!(attributes["demagogCategory"], Value::Null);
    assert_eq!(attributes["comment"], "komentarz");
    assert_eq!(attributes["upvoteCountExceptUser"], 0);
    assert_eq!(attributes["doesBelongToUser"], true);

    let relationships = &data["relationships"];
    assert_eq!(relationships["user"]["data"], json!({"type": "users", "id": user_id}));
    assert_eq!(relationships["annotationUpvote"]["data"], Value::Null);
    assert_eq!(relationships["annotationReports"]["data"], json!([]));
    assert!(relationships["user"]["links"]["related"]
        .as_str()
        .unwrap()
        .ends_with(&format!("/api/annotations/{}/user", data["id"].as_str().unwrap())));
}

#[tokio::test]
async fn test_post_annotation_requires_url_and_category() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let mut payload = annotation_payload("http://www.przypis.pl/");
    payload["data"]["attributes"]
        .as_object_mut()
        .unwrap()
        .remove("url");
    payload["data"]["attributes"]
        .as_object_mut()
        .unwrap()
        .remove("ppCategory");

    let response = app
        .oneshot(request("POST", "/api/annotations", Some(&token), Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    let pointers: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["source"]["pointer"].as_str().unwrap())
        .collect();
    assert!(pointers.contains(&"attributes/url"));
    assert!(pointers.contains(&"attributes/ppCategory"));
}

#[tokio::test]
async fn test_get_single_annotation() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/annotations/{}", id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.api+json"
    );

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["id"], *id);

    let response = app
        .oneshot(request(
            "GET",
            "/api/annotations/no-such-annotation",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// List: URL filter, check_status filter, ordering
// =============================================================================

#[tokio::test]
async fn test_list_filters_by_standardized_url() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    post_annotation(&app, &token, "http://www.przypis.pl/article").await;
    post_annotation(&app, &token, "http://www.other.pl/").await;

    // Tracking params and protocol differences collapse to the same page key
    let uri = "/api/annotations?url=https%3A%2F%2Fwww.przypis.pl%2Farticle%3Futm_campaign%3Dx";
    let response = app
        .clone()
        .oneshot(request("GET", uri, Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["attributes"]["url"], "http://www.przypis.pl/article");
    assert_eq!(body["meta"]["pagination"]["count"], 1);
}

#[tokio::test]
async fn test_list_accepts_url_via_header() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    post_annotation(&app, &token, "http://www.przypis.pl/article").await;

    let req = Request::builder()
        .method("GET")
        .uri("/api/annotations")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header("PP-SITE-URL", "http://www.przypis.pl/article")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_rejects_conflicting_url_sources() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let req = Request::builder()
        .method("GET")
        .uri("/api/annotations?url=http%3A%2F%2Fa.pl%2F")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header("PP-SITE-URL", "http://b.pl/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_orders_newest_first_by_default() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let first = post_annotation(&app, &token, "http://www.przypis.pl/1").await;
    let second = post_annotation(&app, &token, "http://www.przypis.pl/2").await;

    let response = app
        .oneshot(request("GET", "/api/annotations", Some(&token), None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data[0]["id"], second["id"]);
    assert_eq!(data[1]["id"], first["id"]);
}

#[tokio::test]
async fn test_list_filters_by_check_status() {
    let (app, state) = setup().await;
    let (token, _) = signup(&app).await;

    let kept = post_annotation(&app, &token, "http://www.przypis.pl/1").await;
    let excluded = post_annotation(&app, &token, "http://www.przypis.pl/2").await;
    sqlx::query("UPDATE annotations SET check_status = 'PAGE_404' WHERE guid = ?")
        .bind(excluded["id"].as_str().unwrap())
        .execute(&state.db)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/annotations?check_status=UNVERIFIED,CONFIRMED",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], kept["id"]);

    // Unknown status codes are a validation error
    let response = app
        .oneshot(request(
            "GET",
            "/api/annotations?check_status=BOGUS",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_pagination_window() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    for i in 0..3 {
        post_annotation(&app, &token, &format!("http://www.przypis.pl/{}", i)).await;
    }

    let response = app
        .oneshot(request(
            "GET",
            "/api/annotations?page%5Blimit%5D=2&page%5Boffset%5D=0",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["pagination"]["count"], 3);
    assert!(body["links"]["next"].as_str().unwrap().contains("page[offset]=2"));
    assert_eq!(body["links"]["prev"], Value::Null);
}

// =============================================================================
// Patch & delete
// =============================================================================

#[tokio::test]
async fn test_patch_annotation_owner_only() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;
    let (other_token, _) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let id = created["id"].as_str().unwrap();
    let patch_body = json!({
        "data": {
            "type": "annotations",
            "attributes": {"comment": "poprawiony komentarz"}
        }
    });

    // Non-owner is rejected
    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/annotations/{}", id),
            Some(&other_token),
            Some(patch_body.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Owner succeeds
    let response = app
        .oneshot(request(
            "PATCH",
            &format!("/api/annotations/{}", id),
            Some(&token),
            Some(patch_body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["attributes"]["comment"], "poprawiony komentarz");
    // Untouched fields stay
    assert_eq!(body["data"]["attributes"]["quote"], "very nice");
}

#[tokio::test]
async fn test_patch_rejects_relationships_and_empty_patch() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/annotations/{}", id),
            Some(&token),
            Some(json!({"data": {"relationships": {}}})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(
            "PATCH",
            &format!("/api/annotations/{}", id),
            Some(&token),
            Some(json!({"data": {"attributes": {}}})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["errors"], json!([]));
}

#[tokio::test]
async fn test_delete_annotation_soft_deletes() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/annotations/{}", id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Deactivated annotations disappear from reads
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/annotations/{}", id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/annotations", Some(&token), None))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Repeating the delete is a no-op, not an error
    let response = app
        .oneshot(request(
            "DELETE",
            &format!("/api/annotations/{}", id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Upvotes
// =============================================================================

fn upvote_payload(annotation_id: &str) -> Value {
    json!({
        "data": {
            "type": "annotationUpvotes",
            "relationships": {
                "annotation": {
                    "data": {"type": "annotations", "id": annotation_id}
                }
            }
        }
    })
}

#[tokio::test]
async fn test_upvote_lifecycle() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let annotation_id = created["id"].as_str().unwrap();

    // Create
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/annotationUpvotes",
            Some(&token),
            Some(upvote_payload(annotation_id)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let upvote_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["type"], "annotationUpvotes");
    assert_eq!(
        body["data"]["relationships"]["annotation"]["data"],
        json!({"type": "annotations", "id": annotation_id})
    );

    // Duplicate vote fails with a plain 400
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/annotationUpvotes",
            Some(&token),
            Some(upvote_payload(annotation_id)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["errors"][0]["details"], "Failed to create object");

    // Related lookups
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/annotations/{}/upvote", annotation_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["id"], upvote_id.as_str());

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/annotationUpvotes/{}/annotation", upvote_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["id"], annotation_id);

    // Retract
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/annotationUpvotes/{}", upvote_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/annotations/{}/upvote", annotation_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upvote_on_missing_annotation_fails() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/annotationUpvotes",
            Some(&token),
            Some(upvote_payload("no-such-annotation")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["errors"][0]["details"], "Failed to create object");
}

#[tokio::test]
async fn test_upvote_count_excludes_own_vote() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;
    let (other_token, _) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let annotation_id = created["id"].as_str().unwrap();

    for voter in [&token, &other_token] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/annotationUpvotes",
                Some(voter),
                Some(upvote_payload(annotation_id)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // The owner's own vote is not counted for them
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/annotations/{}", annotation_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["attributes"]["upvoteCountExceptUser"], 1);
    assert!(body["data"]["relationships"]["annotationUpvote"]["data"].is_object());
}

// =============================================================================
// Reports
// =============================================================================

fn report_payload(annotation_id: &str, reason: &str, comment: &str) -> Value {
    json!({
        "data": {
            "type": "annotationReports",
            "attributes": {"reason": reason, "comment": comment},
            "relationships": {
                "annotation": {
                    "data": {"type": "annotations", "id": annotation_id}
                }
            }
        }
    })
}

#[tokio::test]
async fn test_report_lifecycle() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let annotation_id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/annotationReports",
            Some(&token),
            Some(report_payload(annotation_id, "SPAM", "")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let report_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["type"], "annotationReports");
    assert_eq!(body["data"]["attributes"]["reason"], "SPAM");

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/annotationReports/{}", report_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Related list comes back as a bare resource array
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/annotations/{}/reports", annotation_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // The report shows up in the annotation's relationships
    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/annotations/{}", annotation_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["data"]["relationships"]["annotationReports"]["data"],
        json!([{"type": "annotationReports", "id": report_id}])
    );
}

#[tokio::test]
async fn test_suggested_correction_requires_comment() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let annotation_id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/annotationReports",
            Some(&token),
            Some(report_payload(annotation_id, "SUGGESTED_CORRECTION", "")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request(
            "POST",
            "/api/annotationReports",
            Some(&token),
            Some(report_payload(annotation_id, "SUGGESTED_CORRECTION", "tu poprawka")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_report_on_missing_annotation_is_404() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/annotationReports",
            Some(&token),
            Some(report_payload("no-such-annotation", "SPAM", "")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Annotation requests & unsubscribe
// =============================================================================

#[tokio::test]
async fn test_annotation_request_and_unsubscribe() {
    let (app, state) = setup().await;
    let (token, _) = signup(&app).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/annotationRequests",
            Some(&token),
            Some(json!({
                "data": {
                    "type": "annotationRequests",
                    "attributes": {
                        "url": "http://www.przypis.pl/article",
                        "quote": "sporny fragment",
                        "notificationEmail": "reader@example.com"
                    }
                }
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let request_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["type"], "annotationRequests");
    assert_eq!(body["data"]["attributes"]["url"], "http://www.przypis.pl/article");

    // Bad token leaves the subscription alone
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/annotationRequests/{}/unsubscribe/forged", request_id),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The signed link clears the notification address
    let token_value = unsubscribe_token(&state.config.auth.secret_key, &request_id);
    let response = app
        .oneshot(request(
            "GET",
            &format!(
                "/api/annotationRequests/{}/unsubscribe/{}",
                request_id, token_value
            ),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let email: String =
        sqlx::query_scalar("SELECT notification_email FROM annotation_requests WHERE guid = ?")
            .bind(&request_id)
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(email, "");
}

#[tokio::test]
async fn test_annotation_request_validates_email() {
    let (app, _state) = setup().await;
    let (token, _) = signup(&app).await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/annotationRequests",
            Some(&token),
            Some(json!({
                "data": {
                    "type": "annotationRequests",
                    "attributes": {
                        "url": "http://www.przypis.pl/",
                        "notificationEmail": "not-an-address"
                    }
                }
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Related user
// =============================================================================

#[tokio::test]
async fn test_annotation_related_user() {
    let (app, _state) = setup().await;
    let (token, user_id) = signup(&app).await;

    let created = post_annotation(&app, &token, "http://www.przypis.pl/").await;
    let annotation_id = created["id"].as_str().unwrap();

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/annotations/{}/user", annotation_id),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["id"], user_id);
    assert_eq!(body["data"]["type"], "users");
}
