//! Per-command trust and run-history store, backed by SQLite.
//!
//! Rejection counts and success rates persist across sessions so the
//! adaptive-confirmation policy in [`super::gate`] can decide whether a
//! command has earned auto-run.

use crate::models::TrustEntry;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustStoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Base command (e.g. `ls` out of `ls -la /tmp`) used only to aggregate
/// usage counts across flag variations for the learning-offer threshold
/// (§4.4). Trust itself is keyed on the exact invocation: trusting
/// `ls -la` must not auto-run `ls -la /etc`.
fn base_command(command: &str) -> String {
    shell_words::split(command)
        .ok()
        .and_then(|tokens| tokens.into_iter().next())
        .unwrap_or_else(|| command.to_string())
}

pub struct TrustStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS trust_entries (
        command TEXT PRIMARY KEY,
        base_command TEXT NOT NULL,
        run_count INTEGER NOT NULL DEFAULT 0,
        success_count INTEGER NOT NULL DEFAULT 0,
        rejection_count INTEGER NOT NULL DEFAULT 0,
        trusted INTEGER NOT NULL DEFAULT 0
    )";

impl TrustStore {
    pub fn open(path: &Path) -> Result<Self, TrustStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self, TrustStoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Exact-invocation lookup, used by the auto-run eligibility check and
    /// by `is_trusted`.
    pub fn get(&self, command: &str) -> Option<TrustEntry> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT command, run_count, success_count, rejection_count, trusted
             FROM trust_entries WHERE command = ?1",
            params![command],
            |row| {
                Ok(TrustEntry {
                    command: row.get(0)?,
                    run_count: row.get(1)?,
                    success_count: row.get(2)?,
                    rejection_count: row.get(3)?,
                    trusted: row.get::<_, i64>(4)? != 0,
                })
            },
        )
        .ok()
    }

    /// Usage aggregated across every exact invocation sharing `command`'s
    /// base command, used only to decide when to offer trust (§4.4's
    /// learning threshold, not the auto-run decision itself).
    pub fn usage(&self, command: &str) -> TrustEntry {
        let base = base_command(command);
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COALESCE(SUM(run_count), 0), COALESCE(SUM(success_count), 0),
                    COALESCE(SUM(rejection_count), 0)
             FROM trust_entries WHERE base_command = ?1",
            params![base],
            |row| {
                Ok(TrustEntry {
                    command: base.clone(),
                    run_count: row.get(0)?,
                    success_count: row.get(1)?,
                    rejection_count: row.get(2)?,
                    trusted: false,
                })
            },
        )
        .unwrap_or_default()
    }

    pub fn record_run(&self, command: &str, success: bool) -> Result<TrustEntry, TrustStoreError> {
        let base = base_command(command);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO trust_entries (command, base_command, run_count, success_count)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(command) DO UPDATE SET
                run_count = run_count + 1,
                success_count = success_count + ?3",
            params![command, base, i64::from(success)],
        )?;
        drop(conn);
        Ok(self.get(command).unwrap_or_default())
    }

    pub fn record_rejection(&self, command: &str) -> Result<(), TrustStoreError> {
        let base = base_command(command);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO trust_entries (command, base_command, rejection_count)
             VALUES (?1, ?2, 1)
             ON CONFLICT(command) DO UPDATE SET rejection_count = rejection_count + 1",
            params![command, base],
        )?;
        Ok(())
    }

    pub fn trust(&self, command: &str) -> Result<(), TrustStoreError> {
        let base = base_command(command);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO trust_entries (command, base_command, trusted) VALUES (?1, ?2, 1)
             ON CONFLICT(command) DO UPDATE SET trusted = 1",
            params![command, base],
        )?;
        Ok(())
    }

    /// Exact-invocation check: trusting `ls -la` must not trust
    /// `ls -other-flags`.
    pub fn is_trusted(&self, command: &str) -> bool {
        self.get(command).map(|e| e.trusted).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_command_is_untrusted() {
        let store = TrustStore::in_memory().unwrap();
        assert!(!store.is_trusted("ls -la"));
    }

    #[test]
    fn six_successes_yield_high_success_rate() {
        let store = TrustStore::in_memory().unwrap();
        for _ in 0..6 {
            store.record_run("ls -la", true).unwrap();
        }
        let entry = store.get("ls -la").unwrap();
        assert_eq!(entry.run_count, 6);
        assert!(entry.success_rate() >= 0.8);
    }

    #[test]
    fn rejection_count_accumulates() {
        let store = TrustStore::in_memory().unwrap();
        store.record_rejection("rm -rf /tmp/x").unwrap();
        store.record_rejection("rm -rf /tmp/x").unwrap();
        assert_eq!(store.get("rm -rf /tmp/x").unwrap().rejection_count, 2);
    }

    #[test]
    fn trust_does_not_survive_different_flag_combinations() {
        let store = TrustStore::in_memory().unwrap();
        store.trust("ls -la /tmp").unwrap();
        assert!(!store.is_trusted("ls -other-flags"));
        assert!(store.is_trusted("ls -la /tmp"));
    }

    #[test]
    fn usage_aggregates_across_flag_variations() {
        let store = TrustStore::in_memory().unwrap();
        store.record_run("ls -la", true).unwrap();
        store.record_run("ls -lh", true).unwrap();
        store.record_rejection("ls -al").unwrap();
        let usage = store.usage("ls -la");
        assert_eq!(usage.run_count, 2);
        assert_eq!(usage.rejection_count, 1);
    }
}
