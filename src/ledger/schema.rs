//! Database schema definitions for the resume ledger

use rusqlite::Connection;

/// SQL schema for the ledger database
pub const SCHEMA_SQL: &str = r#"
-- Per-campaign resume points; append-or-upsert, never deleted
CREATE TABLE IF NOT EXISTS campaign_progress (
    campaign_id TEXT PRIMARY KEY,
    last_cursor TEXT NOT NULL,
    pages_persisted INTEGER NOT NULL DEFAULT 0,
    complete INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Archive of terminal walker runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL,
    status TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_runs_campaign ON runs(campaign_id);

-- Audit trail: one row per fetch attempt, success or failure
CREATE TABLE IF NOT EXISTS fetch_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id TEXT NOT NULL,
    cursor TEXT NOT NULL,
    outcome TEXT NOT NULL,
    attempted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fetch_log_campaign ON fetch_log(campaign_id);

-- At most one active run per campaign
CREATE TABLE IF NOT EXISTS active_claims (
    campaign_id TEXT PRIMARY KEY,
    claimed_at TEXT NOT NULL
);
"#;

/// Initializes the ledger schema on the given connection
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
