//! One fetched page of the donor stream

use crate::model::{Cursor, Donation};
use chrono::{DateTime, Utc};

/// A single page of donor records plus the continuation for the next page
///
/// `next_cursor` is `Cursor::End` if and only if this is the last page of the
/// stream. A page may carry records *and* the end marker in the same response.
#[derive(Debug, Clone)]
pub struct CursorPage {
    /// The campaign this page belongs to
    pub campaign_id: String,

    /// Donor rows in the order the platform returned them
    pub records: Vec<Donation>,

    /// Where the next page begins, or `End` when the stream is exhausted
    pub next_cursor: Cursor,

    /// When this page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CursorPage {
    /// True when this is the final page of the stream
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_end()
    }
}
