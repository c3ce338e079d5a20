//! Batch coordinator
//!
//! Reconciles the selector's candidate list against the ledger, then walks
//! the remaining campaigns. Campaigns have no data dependency on each other
//! and run concurrently under a semaphore bound; within one campaign the walk
//! is strictly sequential. A campaign that aborts never fails the batch -
//! its ledger entry keeps it retryable on the next scheduled invocation.

use crate::config::Config;
use crate::fetch::{HttpPageFetcher, PageFetcher};
use crate::ledger::{ResumeLedger, SqliteLedger};
use crate::model::{Cursor, RunStatus, ScrapeRun};
use crate::output::PageStore;
use crate::walker::{PaginationWalker, RetryPolicy};
use crate::worklist::{load_candidates, reconcile};
use crate::HarvestError;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of one scheduled batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<String>,
    pub aborted: Vec<String>,
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Human-readable batch summary
    pub fn summary(&self) -> String {
        let total = self.completed.len() + self.aborted.len() + self.skipped.len();
        format!(
            "{} of {} campaigns completed, {} aborted, retry on next scheduled run",
            self.completed.len(),
            total,
            self.aborted.len()
        )
    }
}

/// Orchestrates walker runs across the reconciled worklist
pub struct Harvester {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    ledger: Arc<Mutex<SqliteLedger>>,
    store: PageStore,
}

impl Harvester {
    /// Creates a harvester with the HTTP fetcher from `[source]` config
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = Arc::new(HttpPageFetcher::new(&config.source)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Creates a harvester over an arbitrary page fetcher
    pub fn with_fetcher(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, HarvestError> {
        let mut ledger = SqliteLedger::new(Path::new(&config.output.ledger_path))?;
        // A crashed process cannot release its claims
        ledger.clear_claims()?;

        let store = PageStore::new(&config.output.data_dir);

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            ledger: Arc::new(Mutex::new(ledger)),
            store,
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_consecutive_failures: self.config.harvest.max_consecutive_failures,
            backoff_base: Duration::from_millis(self.config.harvest.retry_backoff_ms),
        }
    }

    /// Campaigns still to scrape: selector candidates minus the campaigns the
    /// ledger records as fully captured
    pub fn worklist(&self) -> Result<Vec<String>, HarvestError> {
        let candidates = load_candidates(Path::new(&self.config.selector.candidates_path))?;
        let ids: Vec<String> = candidates.into_iter().map(|c| c.campaign_id).collect();

        let complete = {
            let ledger = self.ledger.lock().unwrap();
            ledger.complete_campaigns()?
        };

        let to_scrape = reconcile(&ids, &complete);
        tracing::info!(
            candidates = ids.len(),
            already_complete = ids.len() - to_scrape.len(),
            to_scrape = to_scrape.len(),
            "worklist reconciled"
        );
        Ok(to_scrape)
    }

    /// Runs one walker for a single campaign, resuming from the ledger
    ///
    /// `fresh` starts from the stream head even when a resume point exists,
    /// replacing the earlier capture. Without it, a fully captured campaign
    /// is skipped with a zero-page completed run. Returns `CampaignClaimed`
    /// when another run already holds the campaign.
    pub async fn run_campaign(
        &self,
        campaign_id: &str,
        fresh: bool,
        cancel: &CancellationToken,
    ) -> Result<ScrapeRun, HarvestError> {
        let start_cursor = {
            let mut ledger = self.ledger.lock().unwrap();
            if !ledger.claim(campaign_id)? {
                return Err(HarvestError::CampaignClaimed(campaign_id.to_string()));
            }
            if fresh {
                None
            } else {
                match ledger.get(campaign_id)? {
                    // A complete entry has no cursor left to fetch from; only
                    // a fresh run re-harvests a fully captured campaign.
                    Some(entry) if entry.is_complete() => {
                        ledger.release(campaign_id)?;
                        tracing::info!(%campaign_id, "campaign already fully captured, skipping");
                        let mut run = ScrapeRun::new(campaign_id);
                        run.complete();
                        return Ok(run);
                    }
                    entry => entry.map(|e| e.last_successful_cursor),
                }
            }
        };

        let walker = PaginationWalker::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.ledger),
            self.store.clone(),
            self.retry_policy(),
        );

        let result = walker.run(campaign_id, start_cursor, cancel).await;

        {
            let mut ledger = self.ledger.lock().unwrap();
            ledger.release(campaign_id)?;
        }

        result
    }

    /// Walks every campaign on the reconciled worklist
    ///
    /// Campaigns run concurrently, bounded by `max-concurrent-campaigns`.
    /// Individual aborts are reported, not raised.
    pub async fn run(
        self: &Arc<Self>,
        fresh: bool,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, HarvestError> {
        let worklist = self.worklist()?;
        let semaphore = Arc::new(Semaphore::new(
            self.config.harvest.max_concurrent_campaigns as usize,
        ));

        let mut tasks = JoinSet::new();
        for campaign_id in worklist {
            let harvester = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                let outcome = harvester.run_campaign(&campaign_id, fresh, &cancel).await;
                (campaign_id, outcome)
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            let (campaign_id, outcome) = joined.expect("walker task panicked");
            match outcome {
                Ok(run) if run.status == RunStatus::Completed => {
                    report.completed.push(campaign_id);
                }
                Ok(_) => report.aborted.push(campaign_id),
                Err(HarvestError::CampaignClaimed(_)) => {
                    tracing::warn!(%campaign_id, "campaign already claimed by an active run, skipping");
                    report.skipped.push(campaign_id);
                }
                Err(e) => {
                    // Local infrastructure failure (disk, ledger); the ledger
                    // still holds the last good page, so treat as aborted.
                    tracing::error!(%campaign_id, error = %e, "campaign run failed");
                    report.aborted.push(campaign_id);
                }
            }
        }

        tracing::info!("{}", report.summary());
        Ok(report)
    }

    /// Resume point a non-fresh run of this campaign would start from
    pub fn resume_cursor(&self, campaign_id: &str) -> Result<Option<Cursor>, HarvestError> {
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger
            .get(campaign_id)?
            .map(|entry| entry.last_successful_cursor))
    }

    /// All ledger entries, for the stats report
    pub fn progress_entries(&self) -> Result<Vec<crate::ledger::LedgerEntry>, HarvestError> {
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger.entries()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HarvestConfig, OutputConfig, SelectorConfig, SourceConfig};
    use crate::fetch::{FetchError, FetchResult};
    use crate::model::{CursorPage, Donation};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    /// Fetcher double serving a fixed two-page stream per known campaign
    struct FixtureFetcher {
        streams: HashMap<String, Vec<(Vec<i64>, Cursor)>>,
    }

    #[async_trait]
    impl PageFetcher for FixtureFetcher {
        async fn fetch(&self, campaign_id: &str, cursor: &Cursor) -> FetchResult<CursorPage> {
            let stream = self.streams.get(campaign_id).ok_or_else(|| FetchError::Status {
                campaign_id: campaign_id.to_string(),
                cursor: cursor.to_string(),
                status: 404,
            })?;
            let index = match cursor {
                Cursor::Head => 0,
                Cursor::Next(token) => token.parse::<usize>().unwrap(),
                Cursor::End => panic!("fetch past end of stream"),
            };
            let (ids, next) = &stream[index];
            Ok(CursorPage {
                campaign_id: campaign_id.to_string(),
                records: ids
                    .iter()
                    .map(|i| {
                        serde_json::from_str::<Donation>(&format!(
                            r#"{{"id": {}, "amount": 1000}}"#,
                            i
                        ))
                        .unwrap()
                    })
                    .collect(),
                next_cursor: next.clone(),
                fetched_at: Utc::now(),
            })
        }
    }

    fn test_setup(candidates: &[&str]) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let candidates_path = dir.path().join("project_final.csv");
        let mut file = std::fs::File::create(&candidates_path).unwrap();
        writeln!(file, "short_url,donation_percentage").unwrap();
        for id in candidates {
            writeln!(file, "{},0.6", id).unwrap();
        }

        let config = Config {
            harvest: HarvestConfig {
                max_consecutive_failures: 2,
                retry_backoff_ms: 1,
                max_concurrent_campaigns: 2,
            },
            source: SourceConfig {
                base_url: "https://core.example.com/".to_string(),
                sort: "verified".to_string(),
                user_agent: "test-agent".to_string(),
            },
            selector: SelectorConfig {
                candidates_path: candidates_path.to_string_lossy().into_owned(),
            },
            output: OutputConfig {
                data_dir: dir.path().join("data").to_string_lossy().into_owned(),
                ledger_path: dir.path().join("harvest.db").to_string_lossy().into_owned(),
            },
        };
        (dir, config)
    }

    fn two_page_stream(ids_a: Vec<i64>, ids_b: Vec<i64>) -> Vec<(Vec<i64>, Cursor)> {
        vec![
            (ids_a, Cursor::Next("1".to_string())),
            (ids_b, Cursor::End),
        ]
    }

    #[tokio::test]
    async fn batch_completes_campaigns_and_reports() {
        let (_dir, config) = test_setup(&["alpha", "beta"]);
        let fetcher = Arc::new(FixtureFetcher {
            streams: [
                ("alpha".to_string(), two_page_stream(vec![1, 2], vec![3])),
                ("beta".to_string(), two_page_stream(vec![10], vec![11])),
            ]
            .into_iter()
            .collect(),
        });

        let harvester = Arc::new(Harvester::with_fetcher(config, fetcher).unwrap());
        let report = harvester.run(false, &CancellationToken::new()).await.unwrap();

        assert_eq!(report.completed.len(), 2);
        assert!(report.aborted.is_empty());
        assert_eq!(
            report.summary(),
            "2 of 2 campaigns completed, 0 aborted, retry on next scheduled run"
        );

        // A second batch finds nothing left to scrape
        assert!(harvester.worklist().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_campaign_aborts_without_failing_batch() {
        let (_dir, config) = test_setup(&["alpha", "ghost"]);
        let fetcher = Arc::new(FixtureFetcher {
            streams: [("alpha".to_string(), two_page_stream(vec![1], vec![2]))]
                .into_iter()
                .collect(),
        });

        let harvester = Arc::new(Harvester::with_fetcher(config, fetcher).unwrap());
        let report = harvester.run(false, &CancellationToken::new()).await.unwrap();

        assert_eq!(report.completed, vec!["alpha".to_string()]);
        assert_eq!(report.aborted, vec!["ghost".to_string()]);

        // The aborted campaign stays on the worklist for the next run
        assert_eq!(harvester.worklist().unwrap(), vec!["ghost".to_string()]);
    }

    #[tokio::test]
    async fn rerun_of_complete_campaign_skips_without_fetching() {
        let (_dir, config) = test_setup(&["alpha"]);
        let fetcher = Arc::new(FixtureFetcher {
            streams: [("alpha".to_string(), two_page_stream(vec![1], vec![2]))]
                .into_iter()
                .collect(),
        });
        let harvester = Harvester::with_fetcher(config, fetcher).unwrap();
        let cancel = CancellationToken::new();

        let first = harvester.run_campaign("alpha", false, &cancel).await.unwrap();
        assert_eq!(first.status, RunStatus::Completed);
        assert_eq!(first.pages_fetched, 2);

        // The fixture panics on a fetch past end-of-stream, so a second
        // non-fresh run can only pass by never touching the fetcher.
        let second = harvester.run_campaign("alpha", false, &cancel).await.unwrap();
        assert_eq!(second.status, RunStatus::Completed);
        assert_eq!(second.pages_fetched, 0);
    }

    #[tokio::test]
    async fn second_claim_on_same_campaign_is_rejected() {
        let (_dir, config) = test_setup(&["alpha"]);
        let fetcher = Arc::new(FixtureFetcher {
            streams: [("alpha".to_string(), two_page_stream(vec![1], vec![2]))]
                .into_iter()
                .collect(),
        });
        let harvester = Harvester::with_fetcher(config, fetcher).unwrap();

        {
            let mut ledger = harvester.ledger.lock().unwrap();
            assert!(ledger.claim("alpha").unwrap());
        }

        let result = harvester
            .run_campaign("alpha", false, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(HarvestError::CampaignClaimed(_))));
    }

    #[test]
    fn report_summary_counts_aborted_and_skipped() {
        let report = BatchReport {
            completed: vec!["a".to_string()],
            aborted: vec!["b".to_string(), "c".to_string()],
            skipped: vec!["d".to_string()],
        };
        assert_eq!(
            report.summary(),
            "1 of 4 campaigns completed, 2 aborted, retry on next scheduled run"
        );
    }
}
