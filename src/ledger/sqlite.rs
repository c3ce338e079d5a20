//! SQLite implementation of the resume ledger

use crate::ledger::schema::initialize_schema;
use crate::ledger::traits::{AttemptOutcome, LedgerError, LedgerResult, ResumeLedger};
use crate::ledger::LedgerEntry;
use crate::model::{Cursor, ScrapeRun};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

/// SQLite-backed resume ledger
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Opens (or creates) the ledger database at the given path
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory ledger (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
        Ok(LedgerEntry {
            campaign_id: row.get(0)?,
            last_successful_cursor: Cursor::from_db_string(&row.get::<_, String>(1)?),
            pages_persisted: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}

impl ResumeLedger for SqliteLedger {
    fn get(&self, campaign_id: &str) -> LedgerResult<Option<LedgerEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, last_cursor, pages_persisted, updated_at
             FROM campaign_progress WHERE campaign_id = ?1",
        )?;

        let entry = stmt
            .query_row(params![campaign_id], Self::row_to_entry)
            .optional()?;

        Ok(entry)
    }

    fn record_success(
        &mut self,
        campaign_id: &str,
        cursor: &Cursor,
        delta: u32,
    ) -> LedgerResult<()> {
        let tx = self.conn.transaction()?;

        // Idempotency: a checkpoint retried with the cursor already recorded
        // must not double-count pages.
        let existing: Option<String> = tx
            .query_row(
                "SELECT last_cursor FROM campaign_progress WHERE campaign_id = ?1",
                params![campaign_id],
                |row| row.get(0),
            )
            .optional()?;

        if existing.as_deref() == Some(cursor.to_db_string()) {
            tx.commit()?;
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let complete = if cursor.is_end() { 1 } else { 0 };
        tx.execute(
            "INSERT INTO campaign_progress
                 (campaign_id, last_cursor, pages_persisted, complete, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(campaign_id) DO UPDATE SET
                 last_cursor = excluded.last_cursor,
                 pages_persisted = campaign_progress.pages_persisted + excluded.pages_persisted,
                 complete = excluded.complete,
                 updated_at = excluded.updated_at",
            params![campaign_id, cursor.to_db_string(), delta, complete, now],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn reset(&mut self, campaign_id: &str) -> LedgerResult<()> {
        self.conn.execute(
            "DELETE FROM campaign_progress WHERE campaign_id = ?1",
            params![campaign_id],
        )?;
        Ok(())
    }

    fn is_complete(&self, campaign_id: &str) -> LedgerResult<bool> {
        let complete: Option<i64> = self
            .conn
            .query_row(
                "SELECT complete FROM campaign_progress WHERE campaign_id = ?1",
                params![campaign_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(complete == Some(1))
    }

    fn complete_campaigns(&self) -> LedgerResult<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT campaign_id FROM campaign_progress WHERE complete = 1")?;

        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(ids)
    }

    fn entries(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, last_cursor, pages_persisted, updated_at
             FROM campaign_progress ORDER BY campaign_id",
        )?;

        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn record_run(&mut self, run: &ScrapeRun) -> LedgerResult<()> {
        if !run.status.is_terminal() {
            return Err(LedgerError::RunNotTerminal(run.campaign_id.clone()));
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (campaign_id, started_at, finished_at, pages_fetched, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.campaign_id,
                run.started_at.to_rfc3339(),
                now,
                run.pages_fetched,
                run.status.to_db_string(),
            ],
        )?;
        Ok(())
    }

    fn log_attempt(
        &mut self,
        campaign_id: &str,
        cursor: &Cursor,
        outcome: AttemptOutcome,
    ) -> LedgerResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO fetch_log (campaign_id, cursor, outcome, attempted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![campaign_id, cursor.to_string(), outcome.to_db_string(), now],
        )?;
        Ok(())
    }

    fn claim(&mut self, campaign_id: &str) -> LedgerResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO active_claims (campaign_id, claimed_at) VALUES (?1, ?2)",
            params![campaign_id, now],
        )?;
        Ok(inserted == 1)
    }

    fn release(&mut self, campaign_id: &str) -> LedgerResult<()> {
        self.conn.execute(
            "DELETE FROM active_claims WHERE campaign_id = ?1",
            params![campaign_id],
        )?;
        Ok(())
    }

    fn clear_claims(&mut self) -> LedgerResult<()> {
        self.conn.execute("DELETE FROM active_claims", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunStatus;

    #[test]
    fn never_attempted_campaign_is_absent() {
        let ledger = SqliteLedger::new_in_memory().unwrap();
        assert!(ledger.get("unknown").unwrap().is_none());
        assert!(!ledger.is_complete("unknown").unwrap());
    }

    #[test]
    fn record_success_creates_then_advances_entry() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();

        ledger
            .record_success("c1", &Cursor::Next("a".to_string()), 1)
            .unwrap();
        let entry = ledger.get("c1").unwrap().unwrap();
        assert_eq!(entry.last_successful_cursor, Cursor::Next("a".to_string()));
        assert_eq!(entry.pages_persisted, 1);
        assert!(!entry.is_complete());

        ledger
            .record_success("c1", &Cursor::Next("b".to_string()), 1)
            .unwrap();
        let entry = ledger.get("c1").unwrap().unwrap();
        assert_eq!(entry.last_successful_cursor, Cursor::Next("b".to_string()));
        assert_eq!(entry.pages_persisted, 2);
    }

    #[test]
    fn duplicate_cursor_does_not_double_count() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        let cursor = Cursor::Next("a".to_string());

        ledger.record_success("c1", &cursor, 1).unwrap();
        ledger.record_success("c1", &cursor, 1).unwrap();

        let entry = ledger.get("c1").unwrap().unwrap();
        assert_eq!(entry.pages_persisted, 1);
    }

    #[test]
    fn reset_discards_progress_entry() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        ledger
            .record_success("c1", &Cursor::Next("a".to_string()), 1)
            .unwrap();

        ledger.reset("c1").unwrap();
        assert!(ledger.get("c1").unwrap().is_none());
        // resetting an absent entry is a no-op
        ledger.reset("c1").unwrap();
    }

    #[test]
    fn end_cursor_marks_campaign_complete() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();

        ledger
            .record_success("c1", &Cursor::Next("a".to_string()), 1)
            .unwrap();
        assert!(!ledger.is_complete("c1").unwrap());

        ledger.record_success("c1", &Cursor::End, 1).unwrap();
        assert!(ledger.is_complete("c1").unwrap());
        assert!(ledger.get("c1").unwrap().unwrap().is_complete());

        let complete = ledger.complete_campaigns().unwrap();
        assert!(complete.contains("c1"));
        assert_eq!(complete.len(), 1);
    }

    #[test]
    fn claim_rejects_second_holder_until_released() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();

        assert!(ledger.claim("c1").unwrap());
        assert!(!ledger.claim("c1").unwrap());
        assert!(ledger.claim("c2").unwrap());

        ledger.release("c1").unwrap();
        assert!(ledger.claim("c1").unwrap());
    }

    #[test]
    fn clear_claims_sweeps_everything() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        assert!(ledger.claim("c1").unwrap());
        assert!(ledger.claim("c2").unwrap());

        ledger.clear_claims().unwrap();
        assert!(ledger.claim("c1").unwrap());
        assert!(ledger.claim("c2").unwrap());
    }

    #[test]
    fn record_run_requires_terminal_status() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        let mut run = ScrapeRun::new("c1");
        assert!(matches!(
            ledger.record_run(&run),
            Err(LedgerError::RunNotTerminal(_))
        ));

        run.record_page();
        run.complete();
        assert_eq!(run.status, RunStatus::Completed);
        ledger.record_run(&run).unwrap();
    }

    #[test]
    fn fetch_log_accepts_both_outcomes() {
        let mut ledger = SqliteLedger::new_in_memory().unwrap();
        ledger
            .log_attempt("c1", &Cursor::Head, AttemptOutcome::Failure)
            .unwrap();
        ledger
            .log_attempt("c1", &Cursor::Head, AttemptOutcome::Success)
            .unwrap();

        let count: i64 = ledger
            .conn
            .query_row("SELECT COUNT(*) FROM fetch_log WHERE campaign_id = 'c1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(count, 2);
    }
}
