//! Page fetching boundary
//!
//! The walker consumes pages through the [`PageFetcher`] trait; the concrete
//! HTTP implementation lives in [`http`]. Every error variant here is
//! transient from the walker's point of view: it counts toward the
//! consecutive-failure budget and the same cursor is retried, malformed
//! responses included.

mod http;

pub use http::{build_http_client, HttpPageFetcher};

use crate::model::{Cursor, CursorPage};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from a single fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {campaign_id} at {cursor}: {source}")]
    Http {
        campaign_id: String,
        cursor: String,
        source: reqwest::Error,
    },

    #[error("Request timeout for {campaign_id} at {cursor}")]
    Timeout { campaign_id: String, cursor: String },

    #[error("Unexpected status {status} for {campaign_id} at {cursor}")]
    Status {
        campaign_id: String,
        cursor: String,
        status: u16,
    },

    #[error("Malformed donor page for {campaign_id} at {cursor}: {message}")]
    Malformed {
        campaign_id: String,
        cursor: String,
        message: String,
    },
}

/// Result type for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Source of donor pages for the pagination walker
///
/// Implementations own everything about how a cursor is embedded in a request;
/// the walker only ever passes back the opaque cursor it received.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page of the campaign's donor stream
    ///
    /// `cursor` is `Cursor::Head` for the first page of a fresh walk, or a
    /// previously observed continuation when resuming.
    async fn fetch(&self, campaign_id: &str, cursor: &Cursor) -> FetchResult<CursorPage>;
}
