//! pp-api library - REST API service for the Przypis annotation backend
//!
//! Serves the browser extension: annotations attached to web pages, upvotes,
//! reports, annotation requests and user identity, all in a JSON:API-style
//! envelope.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use pp_common::config::Config;

use crate::mail::Mailer;

pub mod api;
pub mod db;
pub mod filters;
pub mod jsonapi;
pub mod mail;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service configuration
    pub config: Arc<Config>,
    /// Mailgun client for notification mails
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let mailer = Mailer::new(config.mail.clone());
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }
}

/// Build application router
///
/// Resource routes sit behind the bearer-token middleware; health, login and
/// the mail unsubscribe endpoint stay public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route(
            "/api/annotations",
            get(api::annotations::list).post(api::annotations::create),
        )
        .route(
            "/api/annotations/:annotation_id",
            get(api::annotations::get_single)
                .patch(api::annotations::patch)
                .delete(api::annotations::delete),
        )
        .route(
            "/api/annotations/:annotation_id/user",
            get(api::users::annotation_related_user),
        )
        .route(
            "/api/annotations/:annotation_id/upvote",
            get(api::annotation_upvotes::annotation_related_upvote),
        )
        .route(
            "/api/annotations/:annotation_id/reports",
            get(api::annotation_reports::annotation_related_reports),
        )
        .route(
            "/api/annotationUpvotes",
            post(api::annotation_upvotes::create),
        )
        .route(
            "/api/annotationUpvotes/:upvote_id",
            get(api::annotation_upvotes::get_single).delete(api::annotation_upvotes::delete),
        )
        .route(
            "/api/annotationUpvotes/:upvote_id/annotation",
            get(api::annotations::upvote_related_annotation),
        )
        .route(
            "/api/annotationReports",
            post(api::annotation_reports::create),
        )
        .route(
            "/api/annotationReports/:report_id",
            get(api::annotation_reports::get_single),
        )
        .route(
            "/api/annotationReports/:report_id/annotation",
            get(api::annotations::report_related_annotation),
        )
        .route(
            "/api/annotationRequests",
            post(api::annotation_requests::create),
        )
        .route("/api/users/:user_id", get(api::users::get_single))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    let public = Router::new()
        .route("/health", get(api::health::health_check))
        .route("/api/auth/lazy", post(api::auth::lazy_signup))
        .route("/api/auth/login/:provider", post(api::auth::social_login))
        .route(
            "/api/annotationRequests/:request_id/unsubscribe/:token",
            get(api::annotation_requests::unsubscribe),
        );

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
