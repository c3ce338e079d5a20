//! Per-invocation run state for a pagination walk

use chrono::{DateTime, Utc};

/// Terminalness of one walker invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// Walk in progress
    Running,
    /// Stream end reached, all pages persisted
    Completed,
    /// Retry budget exhausted or cancelled; ledger holds the resume point
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Converts the status to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    /// Parses a status from a database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}

/// State of one pagination walk over a single campaign
///
/// Created when the walker starts, mutated after every fetch attempt, and
/// archived to the ledger store once the status turns terminal.
#[derive(Debug, Clone)]
pub struct ScrapeRun {
    pub campaign_id: String,
    pub started_at: DateTime<Utc>,
    pub pages_fetched: u32,
    pub consecutive_failures: u32,
    pub status: RunStatus,
}

impl ScrapeRun {
    pub fn new(campaign_id: &str) -> Self {
        Self {
            campaign_id: campaign_id.to_string(),
            started_at: Utc::now(),
            pages_fetched: 0,
            consecutive_failures: 0,
            status: RunStatus::Running,
        }
    }

    /// Records a successfully fetched and persisted page
    ///
    /// A success resets the consecutive failure count.
    pub fn record_page(&mut self) {
        self.pages_fetched += 1;
        self.consecutive_failures = 0;
    }

    /// Records a failed fetch attempt
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
    }

    pub fn abort(&mut self) {
        self.status = RunStatus::Aborted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_starts_running() {
        let run = ScrapeRun::new("sehatisyawal");
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.pages_fetched, 0);
        assert_eq!(run.consecutive_failures, 0);
    }

    #[test]
    fn success_resets_failure_streak() {
        let mut run = ScrapeRun::new("c1");
        run.record_failure();
        run.record_failure();
        assert_eq!(run.consecutive_failures, 2);

        run.record_page();
        assert_eq!(run.consecutive_failures, 0);
        assert_eq!(run.pages_fetched, 1);
    }

    #[test]
    fn status_db_round_trip() {
        for status in [RunStatus::Running, RunStatus::Completed, RunStatus::Aborted] {
            assert_eq!(RunStatus::from_db_string(status.to_db_string()), Some(status));
        }
        assert_eq!(RunStatus::from_db_string("bogus"), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Aborted.is_terminal());
    }
}
