//! HTTP API handlers

pub mod annotation_reports;
pub mod annotation_requests;
pub mod annotation_upvotes;
pub mod annotations;
pub mod auth;
pub mod health;
pub mod users;
