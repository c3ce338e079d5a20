//! Pagination walker - the fetch-persist-advance cycle for one campaign
//!
//! Walks the donor stream page by page until end-of-stream or until the
//! consecutive-failure budget is exhausted. Every successfully fetched page
//! is written to disk *before* the resume ledger advances, so a crash between
//! the two at worst re-fetches one page (an idempotent overwrite by page
//! number), never loses or skips one. The fetch call is the only suspension
//! point; persistence and ledger updates are fast local I/O.

use crate::fetch::PageFetcher;
use crate::ledger::{AttemptOutcome, ResumeLedger, SqliteLedger};
use crate::model::{Cursor, RunStatus, ScrapeRun};
use crate::output::PageStore;
use crate::HarvestError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bounded retry behavior for transient fetch failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated before the run aborts
    pub max_consecutive_failures: u32,

    /// Base delay before retrying the same cursor; doubles per consecutive
    /// failure, capped at one minute
    pub backoff_base: Duration,
}

impl RetryPolicy {
    const BACKOFF_CAP: Duration = Duration::from_secs(60);

    /// Delay before the next attempt, given the failure streak so far
    pub fn backoff(&self, consecutive_failures: u32) -> Duration {
        let exponent = consecutive_failures.saturating_sub(1).min(16);
        let delay = self.backoff_base.saturating_mul(1u32 << exponent);
        delay.min(Self::BACKOFF_CAP)
    }
}

/// Drives repeated page fetches for one campaign at a time
pub struct PaginationWalker {
    fetcher: Arc<dyn PageFetcher>,
    ledger: Arc<Mutex<SqliteLedger>>,
    store: PageStore,
    policy: RetryPolicy,
}

impl PaginationWalker {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        ledger: Arc<Mutex<SqliteLedger>>,
        store: PageStore,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            ledger,
            store,
            policy,
        }
    }

    /// Executes the walk for one campaign
    ///
    /// # Arguments
    ///
    /// * `campaign_id` - the campaign to walk (non-empty)
    /// * `start_cursor` - `None` to begin at the stream head (discarding any
    ///   pages and ledger entry from an earlier capture), or a previously
    ///   observed cursor to resume mid-stream
    /// * `cancel` - checked cooperatively before every fetch attempt
    ///
    /// # Returns
    ///
    /// The terminal [`ScrapeRun`]: `Completed` when end-of-stream was
    /// reached, `Aborted` on an exhausted retry budget or cancellation.
    /// Fetch failures never escape as errors - only local infrastructure
    /// problems (ledger, disk) do.
    pub async fn run(
        &self,
        campaign_id: &str,
        start_cursor: Option<Cursor>,
        cancel: &CancellationToken,
    ) -> Result<ScrapeRun, HarvestError> {
        let mut run = ScrapeRun::new(campaign_id);
        let mut cursor = start_cursor.unwrap_or(Cursor::Head);

        // A walk from the stream head supersedes any earlier capture: stale
        // pages and the ledger entry are cleared so numbering restarts at 1.
        // A mid-stream resume continues where the ledger left off, keeping
        // the 1..N no-gap property across interrupted runs.
        let mut page_no = if cursor.is_head() {
            self.store
                .remove_pages(campaign_id)
                .map_err(|source| HarvestError::Output {
                    campaign_id: campaign_id.to_string(),
                    source,
                })?;
            let mut ledger = self.ledger.lock().unwrap();
            ledger.reset(campaign_id)?;
            0
        } else {
            let ledger = self.ledger.lock().unwrap();
            ledger
                .get(campaign_id)?
                .map(|entry| entry.pages_persisted)
                .unwrap_or(0)
        };

        tracing::info!(%campaign_id, start = %cursor, resumed_pages = page_no, "starting donor walk");

        loop {
            if cancel.is_cancelled() {
                tracing::info!(%campaign_id, "walk cancelled, ledger keeps the last persisted page");
                run.abort();
                break;
            }

            match self.fetcher.fetch(campaign_id, &cursor).await {
                Ok(page) => {
                    {
                        let mut ledger = self.ledger.lock().unwrap();
                        ledger.log_attempt(campaign_id, &cursor, AttemptOutcome::Success)?;
                    }

                    let drifted = page.records.iter().filter(|d| d.has_drift()).count();
                    if drifted > 0 {
                        tracing::warn!(
                            %campaign_id,
                            drifted,
                            "donor rows carried fields outside the known schema"
                        );
                    }

                    page_no += 1;
                    self.store
                        .write_page(&page, page_no)
                        .map_err(|source| HarvestError::Output {
                            campaign_id: campaign_id.to_string(),
                            source,
                        })?;

                    run.record_page();
                    cursor = page.next_cursor.clone();

                    // Only after the page file is durably written
                    {
                        let mut ledger = self.ledger.lock().unwrap();
                        ledger.record_success(campaign_id, &cursor, 1)?;
                    }

                    tracing::debug!(%campaign_id, page_no, records = page.records.len(), next = %cursor, "page persisted");

                    if page.is_last() {
                        run.complete();
                        break;
                    }
                }
                Err(err) => {
                    run.record_failure();
                    {
                        let mut ledger = self.ledger.lock().unwrap();
                        ledger.log_attempt(campaign_id, &cursor, AttemptOutcome::Failure)?;
                    }
                    tracing::warn!(
                        %campaign_id,
                        %cursor,
                        attempt = run.consecutive_failures,
                        budget = self.policy.max_consecutive_failures,
                        error = %err,
                        "fetch attempt failed"
                    );

                    if run.consecutive_failures >= self.policy.max_consecutive_failures {
                        run.abort();
                        break;
                    }

                    // Retry the same cursor - a failed fetch must not skip a page
                    tokio::time::sleep(self.policy.backoff(run.consecutive_failures)).await;
                }
            }
        }

        // The artifact reflects exactly the persisted pages on both outcomes
        self.store
            .rebuild_artifact(campaign_id)
            .map_err(|source| HarvestError::Output {
                campaign_id: campaign_id.to_string(),
                source,
            })?;

        {
            let mut ledger = self.ledger.lock().unwrap();
            ledger.record_run(&run)?;
        }

        match run.status {
            RunStatus::Completed => {
                tracing::info!(%campaign_id, pages = run.pages_fetched, "donor walk completed")
            }
            _ => tracing::warn!(%campaign_id, pages = run.pages_fetched, "donor walk aborted"),
        }

        Ok(run)
    }
}
