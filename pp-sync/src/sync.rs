//! Create-or-update reconciliation of Demagog statements
//!
//! A statement is identified by `(publisher = DEMAGOG, publisher_annotation_id)`.
//! Unknown statements become new annotations owned by the Demagog system
//! user; known ones are updated only when a mapped field actually changed.

use sqlx::SqlitePool;
use tracing::{info, warn};

use pp_common::consts::DemagogCategory;
use pp_common::Result;

use crate::demagog::{DemagogClient, Statement};
use crate::store::{self, SyncedFields};

/// Link title used for all Demagog annotations
const DEMAGOG_LINK_TITLE: &str = "Demagog.org.pl";

/// What happened to one statement during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

impl SyncOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Created => "created",
            SyncOutcome::Updated => "changed",
            SyncOutcome::Unchanged => "ignored",
        }
    }
}

/// Per-run counters
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncSummary {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    /// Pages or sources skipped because of consuming errors
    pub failed_batches: u64,
}

impl SyncSummary {
    fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Demagog-to-annotations reconciliation
pub struct DemagogSync {
    pool: SqlitePool,
    client: DemagogClient,
    /// Owner of all synced annotations
    sync_user_guid: String,
}

impl DemagogSync {
    pub fn new(pool: SqlitePool, client: DemagogClient, sync_user_guid: String) -> Self {
        Self {
            pool,
            client,
            sync_user_guid,
        }
    }

    /// Walk the paginated full feed and reconcile every statement
    pub async fn sync_all_statements(&self) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();
        let mut total_pages = 0u32;
        let mut current_page = 0u32;

        loop {
            current_page += 1;
            info!(
                "Consuming page {} of {}",
                current_page,
                if total_pages == 0 {
                    "unknown".to_string()
                } else {
                    total_pages.to_string()
                }
            );

            match self.client.get_all_statements(current_page).await {
                Ok(page) => {
                    total_pages = page.total_pages;
                    for statement in page.statements {
                        summary.record(self.upsert_statement(&statement).await?);
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    summary.failed_batches += 1;
                }
            }

            if current_page >= total_pages {
                break;
            }
        }

        log_summary("full feed", &summary);
        Ok(summary)
    }

    /// Walk the sources list and reconcile statements source by source
    pub async fn sync_sources_list(&self) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        let sources = match self.client.get_sources_list().await {
            Ok(sources) => sources,
            Err(e) => {
                warn!("{}", e);
                summary.failed_batches += 1;
                return Ok(summary);
            }
        };

        if sources.is_empty() {
            warn!("Sources list is empty");
        } else {
            info!("Starting iteration over {} sources", sources.len());
        }

        for source_url in sources {
            match self.client.get_statements(&source_url).await {
                Ok(statements) => {
                    for statement in statements {
                        summary.record(self.upsert_statement(&statement).await?);
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    summary.failed_batches += 1;
                }
            }
        }

        log_summary("sources list", &summary);
        Ok(summary)
    }

    /// Create-or-update one statement
    pub async fn upsert_statement(&self, statement: &Statement) -> Result<SyncOutcome> {
        let fields = statement_to_fields(statement);

        let outcome = match store::find_by_publisher_id(&self.pool, &statement.id).await? {
            None => {
                store::insert_synced(&self.pool, &self.sync_user_guid, &statement.id, &fields)
                    .await?;
                SyncOutcome::Created
            }
            Some(existing) if store::is_unchanged(&existing, &fields) => SyncOutcome::Unchanged,
            Some(existing) => {
                store::update_synced(&self.pool, &existing.guid, &fields).await?;
                SyncOutcome::Updated
            }
        };

        info!(
            "Annotation with demagog id={} was: {}",
            statement.id,
            outcome.as_str()
        );
        Ok(outcome)
    }
}

/// Map statement attributes onto annotation fields
fn statement_to_fields(statement: &Statement) -> SyncedFields {
    let attrs = &statement.attributes;
    // Ratings are validated at the client boundary; unknown codes cannot
    // reach this point
    let category = DemagogCategory::from_str(&attrs.rating).unwrap_or(DemagogCategory::Unknown);

    SyncedFields {
        url: attrs.source.clone(),
        quote: attrs.text.clone(),
        pp_category: category.pp_category().as_str().to_string(),
        demagog_category: category.as_str().to_string(),
        annotation_link: attrs.factchecker_uri.clone(),
        annotation_link_title: DEMAGOG_LINK_TITLE.to_string(),
        create_date: attrs.date.to_rfc3339(),
    }
}

fn log_summary(mode: &str, summary: &SyncSummary) {
    info!(
        "Demagog sync ({}) finished: {} created, {} changed, {} ignored, {} failed batches",
        mode, summary.created, summary.updated, summary.unchanged, summary.failed_batches
    );
}
