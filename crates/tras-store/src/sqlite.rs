use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tras_models::{AlertRecord, ALERT_TABLE_DDL};

use crate::error::StoreError;
use crate::store::AlertStore;

/// SQLite-backed alert history.
///
/// `rusqlite::Connection` is not `Sync`, so access goes through a `Mutex`.
/// File databases run in WAL mode so the one-shot binary can inspect the
/// history while the daemon holds it open.
pub struct SqliteAlertStore {
    conn: Mutex<Connection>,
}

impl SqliteAlertStore {
    /// Open (creating if needed) the alert database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(ALERT_TABLE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database. Useful for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(ALERT_TABLE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("SQLite mutex poisoned: {e}")))
    }
}

impl AlertStore for SqliteAlertStore {
    fn exists(&self, fingerprint: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare_cached("SELECT 1 FROM alert_records WHERE fingerprint = ?1")?;
        Ok(stmt.exists(rusqlite::params![fingerprint])?)
    }

    fn put(&self, record: &AlertRecord) -> Result<bool, StoreError> {
        let json = serde_json::to_string(record)?;
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO alert_records (fingerprint, record_json, triggered_at) \
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
                record.signal_fingerprint,
                json,
                record.triggered_at.to_rfc3339(),
            ],
        )?;
        if inserted == 0 {
            tracing::debug!(
                fingerprint = %record.signal_fingerprint,
                "alert record already present, keeping existing row"
            );
        }
        Ok(inserted == 1)
    }

    fn get(&self, fingerprint: &str) -> Result<Option<AlertRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare_cached("SELECT record_json FROM alert_records WHERE fingerprint = ?1")?;
        let result = stmt.query_row(rusqlite::params![fingerprint], |row| {
            row.get::<_, String>(0)
        });
        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM alert_records", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}
