//! SQLite storage bootstrap, schema migrations and schema introspection.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the `DS_Tools_Project` catalog.
//! - Apply schema migrations in deterministic order.
//! - Expose the raw `Books` DDL and column introspection for conformance checks.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Callers must not read or write `Books` before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;
pub mod schema;

pub use open::{open_catalog, open_db, open_db_in_memory, open_existing_db};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The target database file does not exist and creation was not requested.
    DatabaseNotFound { path: PathBuf },
    /// `CREATE TABLE` ran against a database that already has the table.
    TableAlreadyExists { table: String },
    /// The directory meant to hold the database file could not be created.
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::DatabaseNotFound { path } => {
                write!(f, "database not found at `{}`", path.display())
            }
            Self::TableAlreadyExists { table } => write!(f, "table `{table}` already exists"),
            Self::DataDir { path, source } => write!(
                f,
                "failed to create data directory `{}`: {source}",
                path.display()
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::DatabaseNotFound { .. } => None,
            Self::TableAlreadyExists { .. } => None,
            Self::DataDir { source, .. } => Some(source),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
