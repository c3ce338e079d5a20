use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub harvest: HarvestConfig,
    pub source: SourceConfig,
    pub selector: SelectorConfig,
    pub output: OutputConfig,
}

/// Pagination walk and concurrency behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Consecutive fetch failures tolerated before a campaign run aborts
    #[serde(rename = "max-consecutive-failures")]
    pub max_consecutive_failures: u32,

    /// Base delay between retries of the same cursor (milliseconds, doubled
    /// per consecutive failure)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound on campaigns walked concurrently
    #[serde(rename = "max-concurrent-campaigns")]
    pub max_concurrent_campaigns: u32,
}

/// Donor-list endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the platform API, e.g. "https://core.kitabisa.com/"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Sort parameter sent with every donor-list request
    #[serde(default = "default_sort")]
    pub sort: String,

    /// User agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

fn default_sort() -> String {
    "verified".to_string()
}

/// Campaign selector contract
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Path to the selector's output CSV (short_url + donation_percentage)
    #[serde(rename = "candidates-path")]
    pub candidates_path: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving page files and concatenated artifacts
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Path to the SQLite resume ledger
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,
}
