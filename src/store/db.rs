//! Shared SQLite handle and schema bootstrap.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use rusqlite::{ffi, Connection, ErrorCode};
use tracing::debug;

use crate::errors::{KeeperError, Result};

/// Busy timeout of databases opened without an explicit one.
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How often a deadline-bound lock retries a held connection.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Rounding the busy handler may leave between its timeout and the deadline.
const DEADLINE_SLACK: Duration = Duration::from_millis(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id       TEXT PRIMARY KEY NOT NULL,
        login    TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS secrets (
        name       TEXT PRIMARY KEY NOT NULL,
        kind       INTEGER NOT NULL,
        ciphertext BLOB NOT NULL,
        owner      TEXT NOT NULL REFERENCES users (id),
        comment    TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS secrets_owner ON secrets (owner);
";

/// A cloneable handle on one SQLite connection.
///
/// SQLite serializes writers anyway; the mutex gives every caller
/// exclusive use of the connection for the duration of one statement.
///
/// A handle may carry a call deadline (see [`Database::with_deadline`]):
/// waiting for the mutex and SQLite's busy handler both stop at it, and the
/// statement then fails with `DeadlineExceeded` instead of running late.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    busy_timeout: Duration,
    deadline: Option<Instant>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    ///
    /// `busy_timeout` bounds how long a statement waits on a locked
    /// database before failing.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path).map_err(KeeperError::storage("open"))?;
        conn.busy_timeout(busy_timeout)
            .map_err(KeeperError::storage("configure"))?;
        let db = Self::bootstrap(conn, busy_timeout)?;

        // Owner-only permissions: the file holds ciphertext and password hashes.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// A private in-memory database, for tests and one-shot tooling.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(KeeperError::storage("open"))?;
        Self::bootstrap(conn, DEFAULT_BUSY_TIMEOUT)
    }

    fn bootstrap(conn: Connection, busy_timeout: Duration) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(KeeperError::storage("configure"))?;
        conn.execute_batch(SCHEMA)
            .map_err(KeeperError::storage("bootstrap"))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            busy_timeout,
            deadline: None,
        })
    }

    /// The same connection, with every lock bounded by `deadline`.
    pub fn with_deadline(&self, deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            ..self.clone()
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        let Some(deadline) = self.deadline else {
            let conn = self.conn.lock().map_err(|_| poisoned())?;
            conn.busy_timeout(self.busy_timeout)
                .map_err(KeeperError::storage("configure"))?;
            return Ok(conn);
        };

        let conn = self.lock_before(deadline)?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(deadline_exceeded());
        }
        conn.busy_timeout(self.busy_timeout.min(remaining))
            .map_err(KeeperError::storage("configure"))?;
        Ok(conn)
    }

    /// Map a failed statement to a `KeeperError`.
    ///
    /// A busy database reported at the deadline is `DeadlineExceeded`;
    /// everything else is a storage error for `op`.
    pub(crate) fn failure(
        &self,
        op: &'static str,
    ) -> impl FnOnce(rusqlite::Error) -> KeeperError {
        let deadline = self.deadline;
        move |source| {
            let at_deadline = deadline
                .is_some_and(|d| d.saturating_duration_since(Instant::now()) <= DEADLINE_SLACK);
            if at_deadline && is_busy(&source) {
                deadline_exceeded()
            } else {
                KeeperError::Storage { op, source }
            }
        }
    }

    fn lock_before(&self, deadline: Instant) -> Result<MutexGuard<'_, Connection>> {
        loop {
            match self.conn.try_lock() {
                Ok(conn) => return Ok(conn),
                Err(TryLockError::Poisoned(_)) => return Err(poisoned()),
                Err(TryLockError::WouldBlock) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(deadline_exceeded());
                    }
                    thread::sleep(LOCK_POLL_INTERVAL.min(remaining));
                }
            }
        }
    }
}

fn poisoned() -> KeeperError {
    KeeperError::StorageUnavailable("connection lock poisoned".into())
}

fn deadline_exceeded() -> KeeperError {
    KeeperError::DeadlineExceeded("database access".into())
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::DatabaseBusy || e.code == ErrorCode::DatabaseLocked
    )
}

/// Whether `err` is a UNIQUE or PRIMARY KEY constraint violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}
