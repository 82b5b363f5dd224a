//! High-level pipeline: orchestrates fetch → enrich → map → upsert per page.
//!
//! This module owns the only mutable loop state (current cursor, running
//! counts, consecutive-failure count) and the failure/resume policy. The
//! controlling invariant for resumability: the recorded cursor advances to a
//! page's next cursor only *after* that page's batch upsert has succeeded,
//! so a failure mid-page leaves the cursor that fetched the failed page as
//! the correct resume point and the page is refetched, not skipped.
//!
//! # Callable From
//! - The CLI layer and the integration tests (against mock source/sink).
//!
//! # Error Handling
//! Any step failing aborts the current page and is handled by the
//! configured [`FailurePolicy`]; retry is an explicit bounded loop, never
//! recursion.

use tracing::{error, info};

use crate::config::SyncConfig;
use crate::contract::{CustomerSink, ProfileSource};
use crate::enrich::enrich_page;
use crate::error::SyncError;
use crate::mapper::{map_customer, VoucherifyCustomer};
use crate::voucherify::upsert_in_chunks;

/// Start sentinel the Segment listing accepts as "from the beginning".
pub const START_CURSOR: &str = "0";

/// Consecutive-failure bound applied when the policy itself carries none.
const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Non-interactive failure policy, selected by the caller. The core never
/// blocks on operator input.
#[derive(Debug, Clone, PartialEq)]
pub enum FailurePolicy {
    /// Abort the run on the first page failure.
    Stop,
    /// Retry the failed page from the retained cursor, tolerating up to the
    /// given number of consecutive failures. Any success resets the count.
    RetryUpTo(u32),
    /// On failure, reset the position to this fixed cursor and continue,
    /// still bounded by the default consecutive-failure budget.
    ResumeFromCursor(String),
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct SyncReport {
    pub pages_fetched: u64,
    pub customers_upserted: u64,
    /// Cursor of the last successfully upserted page.
    pub final_cursor: String,
}

/// The only state carried across loop iterations.
#[derive(Debug)]
struct SyncProgress {
    cursor: String,
    pages_fetched: u64,
    customers_upserted: u64,
    consecutive_failures: u32,
}

struct PageOutcome {
    upserted: usize,
    has_more: bool,
    next_cursor: Option<String>,
}

/// Run a full (or resumed) synchronisation pass.
///
/// Pages are processed strictly in cursor order; page N+1 is never fetched
/// before page N's batch upsert succeeds. Re-running with no start cursor
/// restarts a full pass from the beginning.
pub async fn synchronise<S, K>(
    source: &S,
    sink: &K,
    config: &SyncConfig,
) -> Result<SyncReport, SyncError>
where
    S: ProfileSource + ?Sized,
    K: CustomerSink + ?Sized,
{
    let mut progress = SyncProgress {
        cursor: config
            .start_cursor
            .clone()
            .unwrap_or_else(|| START_CURSOR.to_string()),
        pages_fetched: 0,
        customers_upserted: 0,
        consecutive_failures: 0,
    };

    info!(cursor = %progress.cursor, "starting synchronisation pass");

    loop {
        match process_one_page(source, sink, config, &progress.cursor).await {
            Ok(outcome) => {
                progress.consecutive_failures = 0;
                progress.pages_fetched += 1;
                progress.customers_upserted += outcome.upserted as u64;
                info!(
                    upserted = outcome.upserted,
                    total_upserted = progress.customers_upserted,
                    pages = progress.pages_fetched,
                    cursor = %progress.cursor,
                    "page upserted"
                );

                // Advance only now that the page's batch has been accepted.
                match outcome.next_cursor {
                    Some(next) if outcome.has_more => progress.cursor = next,
                    _ => break,
                }
            }
            Err(err) => {
                progress.consecutive_failures += 1;
                error!(
                    error = %err,
                    cursor = %progress.cursor,
                    consecutive_failures = progress.consecutive_failures,
                    "page failed"
                );

                match &config.policy {
                    FailurePolicy::Stop => return Err(err),
                    FailurePolicy::RetryUpTo(budget) => {
                        if progress.consecutive_failures >= *budget {
                            error!(
                                cursor = %progress.cursor,
                                "retry budget exhausted; resume manually from this cursor"
                            );
                            return Err(err);
                        }
                        info!(cursor = %progress.cursor, "retrying page from retained cursor");
                    }
                    FailurePolicy::ResumeFromCursor(resume_cursor) => {
                        if progress.consecutive_failures >= DEFAULT_RETRY_BUDGET {
                            error!(
                                cursor = %progress.cursor,
                                "retry budget exhausted; resume manually from this cursor"
                            );
                            return Err(err);
                        }
                        info!(cursor = %resume_cursor, "resuming from configured cursor");
                        progress.cursor = resume_cursor.clone();
                    }
                }
            }
        }
    }

    info!(
        pages = progress.pages_fetched,
        customers = progress.customers_upserted,
        "synchronisation pass complete"
    );

    Ok(SyncReport {
        pages_fetched: progress.pages_fetched,
        customers_upserted: progress.customers_upserted,
        final_cursor: progress.cursor,
    })
}

/// One full page cycle: fetch → enrich → map → chunked upsert.
async fn process_one_page<S, K>(
    source: &S,
    sink: &K,
    config: &SyncConfig,
    cursor: &str,
) -> Result<PageOutcome, SyncError>
where
    S: ProfileSource + ?Sized,
    K: CustomerSink + ?Sized,
{
    info!(cursor = %cursor, "fetching profile page");
    let page = source.fetch_page(config.page_limit, cursor).await?;
    info!(ids = page.segment_ids.len(), "downloaded segment profiles");

    if page.segment_ids.is_empty() {
        return Ok(PageOutcome {
            upserted: 0,
            has_more: page.has_more,
            next_cursor: page.next_cursor,
        });
    }

    let enriched = enrich_page(source, &page.segment_ids).await?;

    let customers: Vec<VoucherifyCustomer> = enriched.iter().map(map_customer).collect();
    info!(customers = customers.len(), "mapped customer objects");

    upsert_in_chunks(sink, &customers, config.upsert_batch_size).await?;

    Ok(PageOutcome {
        upserted: customers.len(),
        has_more: page.has_more,
        next_cursor: page.next_cursor,
    })
}
