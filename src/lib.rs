//! Galang-Harvest: incremental crowdfunding donor harvester
//!
//! This crate walks the cursor-paginated donor list of crowdfunding campaigns,
//! persisting every page as it arrives and tracking progress in a durable
//! resume ledger so interrupted runs pick up exactly where they stopped.

pub mod config;
pub mod fetch;
pub mod harvest;
pub mod ledger;
pub mod model;
pub mod output;
pub mod walker;
pub mod worklist;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Campaign {0} already has an active run")]
    CampaignClaimed(String),

    #[error("Worklist error: {0}")]
    Worklist(String),

    #[error("Output error for campaign {campaign_id}: {source}")]
    Output {
        campaign_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{FetchError, PageFetcher};
pub use model::{Cursor, CursorPage, Donation, RunStatus, ScrapeRun};
