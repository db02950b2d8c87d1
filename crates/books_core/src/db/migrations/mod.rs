//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Migration 1 is the unguarded `Books` DDL; the version check is what
//!   keeps reopening a database from re-running it.
//! - A version 0 database that already holds a `Books` table with exactly the
//!   declared columns (one written by the plain DDL) is adopted as version 1.
//!   Any other pre-existing `Books` table fails with `TableAlreadyExists`.

use crate::db::schema::{
    books_shape_matches, is_table_exists_error, table_exists, BOOKS_TABLE,
    CREATE_BOOKS_TABLE_SQL,
};
use crate::db::{DbError, DbResult};
use log::{debug, error, info, warn};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: CREATE_BOOKS_TABLE_SQL,
}];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Returns the schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = schema_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        debug!("event=db_migrate module=db status=skip version={current_version}");
        return Ok(());
    }

    let adopt_existing = current_version == 0 && table_exists(conn, BOOKS_TABLE)?;
    if adopt_existing && !books_shape_matches(conn)? {
        error!(
            "event=db_migrate module=db status=error table={BOOKS_TABLE} error_code=table_shape_mismatch"
        );
        return Err(DbError::TableAlreadyExists {
            table: BOOKS_TABLE.to_string(),
        });
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        if adopt_existing && migration.version == 1 {
            warn!("event=db_migrate module=db status=adopt table={BOOKS_TABLE} version=1");
        } else {
            tx.execute_batch(migration.sql).map_err(|err| {
                if is_table_exists_error(&err) {
                    DbError::TableAlreadyExists {
                        table: BOOKS_TABLE.to_string(),
                    }
                } else {
                    err.into()
                }
            })?;
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        current_version, latest
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, schema_version};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn fresh_connection_starts_at_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn apply_migrations_twice_is_a_no_op() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        apply_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn foreign_books_table_is_not_adopted() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE Books (Id INTEGER PRIMARY KEY, Name TEXT);")
            .unwrap();

        let err = apply_migrations(&mut conn).unwrap_err();
        assert!(matches!(err, DbError::TableAlreadyExists { ref table } if table == "Books"));
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }
}
