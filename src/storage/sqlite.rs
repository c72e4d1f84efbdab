//! `SQLite` backend: schema, opening, inserts, dedup and queries.

use crate::model::types::HistoryRecord;
use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

/// Error from opening the history database.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("database not found at {0} (run `zhist init` first)")]
    NotFound(PathBuf),
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: rusqlite::Error,
    },
}

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS histories (
    id INTEGER PRIMARY KEY,
    command TEXT NOT NULL,
    directory TEXT,
    return_code INTEGER,
    time INTEGER,
    UNIQUE(command, directory, return_code)
);

CREATE INDEX IF NOT EXISTS idx_filter ON histories(return_code, directory, time);
";

// NULL never equals NULL, so the UNIQUE constraint lets bare rows pile up;
// this keeps the oldest row per command among them.
const DELETE_DUPLICATES: &str = r"
DELETE FROM histories
WHERE directory IS NULL
  AND return_code IS NULL
  AND id NOT IN (
      SELECT MIN(id)
      FROM histories
      WHERE directory IS NULL AND return_code IS NULL
      GROUP BY command
  )
";

const INSERT: &str = "INSERT OR REPLACE INTO histories (command, directory, return_code, time)
     VALUES (?1, ?2, ?3, ?4)";

const INSERT_BARE: &str = "INSERT OR IGNORE INTO histories (command) VALUES (?1)";

const SELECT_ALL: &str = "SELECT command FROM histories
     GROUP BY command
     ORDER BY MAX(time) ASC, MAX(id) ASC";

const SELECT_RECENT: &str = "SELECT command FROM histories
     WHERE return_code = 0
     GROUP BY command
     ORDER BY MAX(time) DESC, MAX(id) DESC
     LIMIT ?1";

const SELECT_IN_DIRECTORY: &str = "SELECT command FROM histories
     WHERE return_code = 0 AND directory = ?1
     ORDER BY time ASC, id ASC";

/// Which rows a query selects, in storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryFilter {
    /// Every distinct command, oldest first.
    All,
    /// The `limit` most recently successful distinct commands, newest first.
    Recent { limit: u32 },
    /// Successful commands run in exactly `directory`, oldest first.
    Directory(String),
}

/// Handle to one open history database.
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Create the database (and its parent directory, one level) if absent
    /// and make sure the schema exists.
    pub fn create(path: &Path) -> std::result::Result<Self, OpenError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir(parent).map_err(|source| OpenError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
            debug!(path = %parent.display(), "created database directory");
        }

        let store = Self::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        store.init_schema().map_err(|e| open_failed(path, e))?;
        Ok(store)
    }

    /// Open an existing database for writing.
    pub fn open(path: &Path) -> std::result::Result<Self, OpenError> {
        Self::open_existing(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
    }

    pub fn open_readonly(path: &Path) -> std::result::Result<Self, OpenError> {
        Self::open_existing(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
    }

    fn open_existing(path: &Path, flags: OpenFlags) -> std::result::Result<Self, OpenError> {
        if !path.exists() {
            return Err(OpenError::NotFound(path.to_path_buf()));
        }
        Self::open_with_flags(path, flags)
    }

    fn open_with_flags(path: &Path, flags: OpenFlags) -> std::result::Result<Self, OpenError> {
        let conn = Connection::open_with_flags(path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .map_err(|e| open_failed(path, e))?;
        apply_pragmas(&conn).map_err(|e| open_failed(path, e))?;
        Ok(Self { conn })
    }

    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    /// Create the table and index. Safe to call on an initialized database.
    pub fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(SCHEMA)
    }

    /// Collapse duplicate bare rows, keeping the smallest id per command.
    /// Returns the number of rows removed.
    pub fn delete_duplicates(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute(DELETE_DUPLICATES, [])
            .context("deleting duplicate bare commands")?;
        info!(removed, "deleted duplicate bare commands");
        Ok(removed)
    }

    /// Upsert a command with its context; an identical
    /// (command, directory, return_code) row is replaced so `time` is fresh.
    pub fn insert(&self, command: &str, directory: &str, return_code: i32, time: i64) -> Result<()> {
        self.conn
            .execute(INSERT, params![command, directory, return_code, time])
            .context("inserting history entry")?;
        Ok(())
    }

    /// Insert a context-free command without replacing anything.
    ///
    /// The unique key never matches on NULL columns, so repeated bare
    /// commands accumulate until [`Self::delete_duplicates`] keeps the first.
    pub fn insert_bare(&self, command: &str) -> Result<()> {
        self.conn
            .execute(INSERT_BARE, [command])
            .context("inserting bare command")?;
        Ok(())
    }

    pub fn select(&self, filter: &HistoryFilter) -> Result<Vec<String>> {
        match filter {
            HistoryFilter::All => self.select_all(),
            HistoryFilter::Recent { limit } => self.select_recent(*limit),
            HistoryFilter::Directory(dir) => self.select_in_directory(dir),
        }
    }

    pub fn select_all(&self) -> Result<Vec<String>> {
        self.query_commands(SELECT_ALL, params![])
            .context("selecting all commands")
    }

    pub fn select_recent(&self, limit: u32) -> Result<Vec<String>> {
        self.query_commands(SELECT_RECENT, params![limit])
            .context("selecting recent commands")
    }

    pub fn select_in_directory(&self, directory: &str) -> Result<Vec<String>> {
        self.query_commands(SELECT_IN_DIRECTORY, params![directory])
            .with_context(|| format!("selecting commands run in {directory}"))
    }

    fn query_commands<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Into::into)
    }

    /// Every stored row ordered by id.
    pub fn records(&self) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, command, directory, return_code, time FROM histories ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("listing history rows")
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM histories", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

fn open_failed(path: &Path, source: rusqlite::Error) -> OpenError {
    OpenError::OpenFailed {
        path: path.to_path_buf(),
        source,
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<HistoryRecord> {
    Ok(HistoryRecord {
        id: row.get(0)?,
        command: row.get(1)?,
        directory: row.get(2)?,
        return_code: row.get(3)?,
        time: row.get(4)?,
    })
}

fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    // Concurrent shells serialize on SQLite's file lock.
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA temp_store = MEMORY;")
}
