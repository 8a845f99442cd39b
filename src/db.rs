/// Database session and validation utilities
///
/// Every request opens its own read-only `Session` on the dataset file and
/// drops it when the handler returns, on success or error. A session carries
/// a deadline: SQLite's progress handler interrupts any statement still
/// running once the deadline has passed, so a slow query cannot hold a
/// worker forever.

use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Tables the service reads from.
pub const REQUIRED_TABLES: &[&str] = &["station", "measurement"];

/// Number of SQLite VM instructions between deadline checks.
const PROGRESS_INTERVAL_OPS: i32 = 1000;

#[derive(Debug, Error)]
pub enum DbError {
    /// The dataset file does not exist.
    #[error("Database file not found: {0}")]
    MissingDatabase(PathBuf),
    /// The file exists but could not be opened as SQLite.
    #[error("Failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    /// A required table is absent from the dataset.
    #[error("Required table '{0}' does not exist in the dataset")]
    MissingTable(String),
    /// The session deadline elapsed while a statement was running.
    #[error("Query exceeded the {0:?} time limit")]
    Timeout(Duration),
    /// A stored value could not be decoded.
    #[error("Malformed {column} value {value:?} in the dataset")]
    Decode { column: &'static str, value: String },
    #[error("Database query failed: {0}")]
    Query(#[source] rusqlite::Error),
}

/// A short-lived, read-only connection scoped to one unit of work.
///
/// The connection closes when the session is dropped.
pub struct Session {
    conn: Connection,
    timeout: Duration,
    opened_at: Instant,
}

impl Session {
    /// Opens `path` read-only and arms the query deadline.
    pub fn open(path: &Path, timeout: Duration) -> Result<Self, DbError> {
        if !path.exists() {
            return Err(DbError::MissingDatabase(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| DbError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let session = Self::from_connection(conn, timeout)?;
        log::debug!("session opened on {}", path.display());
        Ok(session)
    }

    /// Wraps an existing connection, e.g. an in-memory database in tests.
    pub fn from_connection(conn: Connection, timeout: Duration) -> Result<Self, DbError> {
        conn.busy_timeout(timeout).map_err(DbError::Query)?;

        let opened_at = Instant::now();
        let deadline = opened_at + timeout;
        conn.progress_handler(PROGRESS_INTERVAL_OPS, Some(move || Instant::now() >= deadline));

        Ok(Self {
            conn,
            timeout,
            opened_at,
        })
    }

    /// Converts a driver error, recognising deadline interrupts.
    pub fn classify(&self, err: rusqlite::Error) -> DbError {
        if err.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
            DbError::Timeout(self.timeout)
        } else {
            DbError::Query(err)
        }
    }

    /// Names of all tables in the dataset, sorted.
    pub fn table_names(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(|e| self.classify(e))?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .and_then(|rows| rows.collect::<Result<Vec<String>, _>>())
            .map_err(|e| self.classify(e))?;
        Ok(names)
    }

    /// Verify every table in `required` exists.
    pub fn verify_tables(&self, required: &[&str]) -> Result<Vec<String>, DbError> {
        let names = self.table_names()?;
        for table in required {
            if !names.iter().any(|n| n == table) {
                return Err(DbError::MissingTable(table.to_string()));
            }
        }
        Ok(names)
    }
}

impl Deref for Session {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        log::debug!("session closed after {:?}", self.opened_at.elapsed());
    }
}

/// Open a session and validate the dataset schema, returning the table list.
pub fn connect_and_verify(path: &Path, timeout: Duration) -> Result<(Session, Vec<String>), DbError> {
    let session = Session::open(path, timeout)?;
    let tables = session.verify_tables(REQUIRED_TABLES)?;
    Ok((session, tables))
}
