//! Database access: initialization, migrations and shared models

mod init;
mod migrations;
mod models;

pub use init::{ensure_system_user, init_database, init_memory_database};
pub use migrations::run_migrations;
pub use models::{Annotation, AnnotationReport, AnnotationRequest, AnnotationUpvote, User};
