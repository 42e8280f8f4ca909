//! A log of finished slices, backed by SQLite.
//!
//! Both front ends write here, so `soragiri history` and the chat `status`
//! command see the same record.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::Connection;
use rusqlite::types::Type;

/// Which front end ran the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cli,
    Discord,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Discord => "discord",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// A slice to record.
#[derive(Debug, Clone)]
pub struct NewRecord<'a> {
    pub source: Source,
    pub url: &'a str,
    pub task_id: Option<&'a str>,
    pub status: Status,
    /// Output URL/path on success, error text on failure.
    pub detail: &'a str,
    pub cost_time_ms: Option<u64>,
}

/// A recorded slice, as read back.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub source: String,
    pub url: String,
    pub task_id: Option<String>,
    pub status: String,
    pub detail: String,
    pub cost_time_ms: Option<u64>,
}

impl Record {
    /// The timestamp in the local zone, or as stored if it doesn't parse.
    pub fn local_time(&self) -> String {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| self.timestamp.clone())
    }
}

pub struct History {
    conn: Mutex<Connection>,
}

impl History {
    /// Open or create the history table. Use `":memory:"` for tests.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path != Path::new(":memory:")
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path).context("failed to open history database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS slices (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp    TEXT NOT NULL,
                source       TEXT NOT NULL,
                url          TEXT NOT NULL,
                task_id      TEXT,
                status       TEXT NOT NULL,
                detail       TEXT NOT NULL,
                cost_time_ms INTEGER
            )",
        )
        .context("failed to create slices table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("history connection poisoned"))
    }

    /// Append a finished slice.
    pub fn record(&self, record: &NewRecord<'_>) -> Result<()> {
        let cost_time_ms = record
            .cost_time_ms
            .map(i64::try_from)
            .transpose()
            .context("cost time out of range")?;
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO slices (timestamp, source, url, task_id, status, detail, cost_time_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                timestamp,
                record.source.as_str(),
                record.url,
                record.task_id,
                record.status.as_str(),
                record.detail,
                cost_time_ms,
            ],
        )?;
        Ok(())
    }

    /// The last `limit` slices, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Record>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, source, url, task_id, status, detail, cost_time_ms
             FROM slices ORDER BY id DESC LIMIT ?1",
        )?;
        let records = stmt
            .query_map([i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
                let cost_time_ms = row
                    .get::<_, Option<i64>>(7)?
                    .map(|ms| {
                        u64::try_from(ms).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(7, Type::Integer, Box::new(e))
                        })
                    })
                    .transpose()?;
                Ok(Record {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    source: row.get(2)?,
                    url: row.get(3)?,
                    task_id: row.get(4)?,
                    status: row.get(5)?,
                    detail: row.get(6)?,
                    cost_time_ms,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of slices with the given status.
    pub fn count(&self, status: Status) -> Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM slices WHERE status = ?1",
            [status.as_str()],
            |row| row.get(0),
        )?;
        u64::try_from(n).context("negative slice count")
    }

    pub fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM slices", [])?;
        Ok(())
    }
}
