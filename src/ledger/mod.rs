//! Resume ledger
//!
//! Durable per-campaign progress store. Each campaign ever attempted has one
//! entry holding the last successfully persisted cursor and the page count;
//! a new run reads it to decide whether to skip (complete), resume (partial),
//! or start fresh. Entries advance as runs persist pages; only a restart from
//! the stream head discards its campaign's entry.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteLedger;
pub use traits::{AttemptOutcome, LedgerError, LedgerResult, ResumeLedger};

use crate::model::Cursor;

/// Progress record for one campaign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub campaign_id: String,

    /// The cursor the next run should fetch from. `Cursor::End` means the
    /// stream was fully captured.
    pub last_successful_cursor: Cursor,

    /// Pages durably written so far; monotonically increasing
    pub pages_persisted: u32,

    /// RFC 3339 timestamp of the last update
    pub updated_at: String,
}

impl LedgerEntry {
    /// True once the recorded cursor is the end-of-stream marker
    pub fn is_complete(&self) -> bool {
        self.last_successful_cursor.is_end()
    }
}
