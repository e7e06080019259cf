//! Local persistence for actors, worksheets, and execution sheets.
//!
//! Everything lives in one `SQLite` file:
//!
//! ```text
//! ~/.fieldops/fieldops.sqlite
//!   actor            # id, role, state, profile (JSON)
//!   worksheet        # id, owner_account, status
//!   execution_sheet  # id, version, body (JSON aggregate)
//! ```
//!
//! Execution sheets are stored whole. Writes are guarded by the `version`
//! column: a save only lands when the stored version is the one the caller
//! loaded.

mod actor;
mod sheet;
mod worksheet;

use std::{fs, io, path::PathBuf};

use rusqlite::Connection;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("actor not found: {0}")]
    ActorNotFound(String),

    #[error("actor already exists: {0}")]
    ActorAlreadyExists(String),

    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),

    #[error("worksheet already exists: {0}")]
    WorksheetAlreadyExists(String),

    #[error("execution sheet not found: {0}")]
    SheetNotFound(String),

    #[error("execution sheet already exists: {0}")]
    SheetAlreadyExists(String),

    #[error("execution sheet {id} changed underneath: loaded version {expected}, stored {found}")]
    VersionConflict { id: String, expected: u64, found: u64 },

    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS actor (
        id      TEXT PRIMARY KEY,
        role    TEXT NOT NULL,
        state   TEXT NOT NULL,
        profile TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS worksheet (
        id            TEXT PRIMARY KEY,
        owner_account TEXT NOT NULL,
        status        TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS execution_sheet (
        id      TEXT PRIMARY KEY,
        version INTEGER NOT NULL,
        body    TEXT NOT NULL
    );
";

/// `SQLite`-backed storage.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    ///
    /// Parent directories are created if they don't exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Returns the default database path: `~/.fieldops/fieldops.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fieldops").join("fieldops.sqlite"))
    }
}
