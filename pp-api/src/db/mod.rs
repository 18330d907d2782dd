//! Database access layer for pp-api
//!
//! One module per entity; all queries run against the pool in
//! [`crate::AppState`]. Schema lives in pp-common.

pub mod annotations;
pub mod reports;
pub mod requests;
pub mod upvotes;
pub mod users;

/// Build a `?, ?, ...` placeholder list for IN clauses
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
