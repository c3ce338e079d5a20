//! Resume ledger trait and error types

use crate::ledger::LedgerEntry;
use crate::model::{Cursor, ScrapeRun};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run for campaign {0} is not terminal")]
    RunNotTerminal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Outcome of one fetch attempt, for the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

impl AttemptOutcome {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Durable per-campaign progress tracker
///
/// A run only ever touches its own campaign's entry, so implementations need
/// per-key atomicity but no cross-campaign locking.
pub trait ResumeLedger {
    /// Looks up the progress entry for a campaign
    ///
    /// `None` means the campaign was never attempted; a present entry's
    /// `last_successful_cursor` is the correct resume point.
    fn get(&self, campaign_id: &str) -> LedgerResult<Option<LedgerEntry>>;

    /// Advances the campaign's resume point after a durably written page
    ///
    /// `cursor` is the *next* cursor to fetch (the persisted page's
    /// continuation). Page counts only increase; calling again with the
    /// exact cursor already recorded is a no-op, so a retried checkpoint
    /// never double-counts.
    fn record_success(&mut self, campaign_id: &str, cursor: &Cursor, delta: u32)
        -> LedgerResult<()>;

    /// Discards a campaign's progress entry, if any
    ///
    /// Used when a walk restarts from the stream head and the recorded
    /// resume point no longer describes anything on disk.
    fn reset(&mut self, campaign_id: &str) -> LedgerResult<()>;

    /// True once a recorded cursor equals the end-of-stream marker
    fn is_complete(&self, campaign_id: &str) -> LedgerResult<bool>;

    /// All campaign ids whose stream has been fully captured
    fn complete_campaigns(&self) -> LedgerResult<HashSet<String>>;

    /// All progress entries, for reporting
    fn entries(&self) -> LedgerResult<Vec<LedgerEntry>>;

    /// Archives a terminal run
    fn record_run(&mut self, run: &ScrapeRun) -> LedgerResult<()>;

    /// Appends one fetch attempt to the audit trail
    fn log_attempt(
        &mut self,
        campaign_id: &str,
        cursor: &Cursor,
        outcome: AttemptOutcome,
    ) -> LedgerResult<()>;

    /// Takes the exclusive claim for a campaign
    ///
    /// Returns false when another run already holds it.
    fn claim(&mut self, campaign_id: &str) -> LedgerResult<bool>;

    /// Releases a campaign's claim
    fn release(&mut self, campaign_id: &str) -> LedgerResult<()>;

    /// Drops all claims; called at startup to sweep claims a crashed
    /// process could not release
    fn clear_claims(&mut self) -> LedgerResult<()>;
}
