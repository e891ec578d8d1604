//! SQLite storage for event logs and latencies
//!
//! Both tables carry a uniqueness constraint over all columns and rows are
//! inserted with `INSERT OR IGNORE`, so importing the same log twice leaves
//! the database unchanged.

use crate::latency::{Latency, LatencyMode};
use crate::Record;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS event_log (
        time  REAL NOT NULL,
        event TEXT NOT NULL,
        UNIQUE(time, event)
    );
    CREATE TABLE IF NOT EXISTS click_latencies (
        time    REAL NOT NULL,
        latency REAL NOT NULL,
        latency_mode TEXT NOT NULL,
        UNIQUE(time, latency)
    );
";

pub struct EventDb {
    conn: Connection,
}

impl EventDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        EventDb::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        EventDb::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("failed to create tables")?;
        Ok(EventDb { conn })
    }

    /// Insert one record; returns false if it was already present
    pub fn insert_record(&self, record: &Record) -> Result<bool> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO event_log (time, event) VALUES (?1, ?2)",
            params![record.time.seconds(), record.value.to_string()],
        )?;
        Ok(n > 0)
    }

    /// Insert records in one transaction; returns the number of new rows
    pub fn insert_records(&mut self, records: &[Record]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut n = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO event_log (time, event) VALUES (?1, ?2)")?;
            for r in records {
                n += stmt.execute(params![r.time.seconds(), r.value.to_string()])?;
            }
        }
        tx.commit()?;
        Ok(n)
    }

    /// Insert one latency measured in `mode`; returns false if already present
    pub fn insert_latency(&self, latency: &Latency, mode: LatencyMode) -> Result<bool> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO click_latencies (time, latency, latency_mode) VALUES (?1, ?2, ?3)",
            params![latency.time.seconds(), latency.latency_ms, mode.name()],
        )?;
        Ok(n > 0)
    }

    pub fn insert_latencies(&mut self, latencies: &[Latency], mode: LatencyMode) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut n = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO click_latencies (time, latency, latency_mode) VALUES (?1, ?2, ?3)",
            )?;
            for l in latencies {
                n += stmt.execute(params![l.time.seconds(), l.latency_ms, mode.name()])?;
            }
        }
        tx.commit()?;
        Ok(n)
    }

    /// Stored (time, event) rows in time order
    pub fn events(&self) -> Result<Vec<(f64, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT time, event FROM event_log ORDER BY time, event")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Stored (time, latency, mode) rows in time order
    pub fn latencies(&self) -> Result<Vec<(f64, f64, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT time, latency, latency_mode FROM click_latencies ORDER BY time")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
