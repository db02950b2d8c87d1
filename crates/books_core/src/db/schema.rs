//! `Books` table contract: DDL, read-all query and column introspection.
//!
//! # Invariants
//! - `CREATE_BOOKS_TABLE_SQL` carries no `IF NOT EXISTS` guard; running it
//!   twice against the same database fails.
//! - `BOOKS_COLUMNS` lists the table columns in declaration order.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, ErrorCode};

/// Name of the catalog table.
pub const BOOKS_TABLE: &str = "Books";

/// Column names of `Books`, in declaration order.
pub const BOOKS_COLUMNS: [&str; 12] = [
    "Id",
    "Title",
    "Price",
    "Rating",
    "Availability",
    "UPC",
    "ProductType",
    "PriceExclTax",
    "PriceInclTax",
    "Tax",
    "NumReviews",
    "Description",
];

/// DDL for the `Books` table.
pub const CREATE_BOOKS_TABLE_SQL: &str = include_str!("migrations/0001_books.sql");

/// The diagnostic read-all query: every row, every column, store order.
pub const SELECT_ALL_BOOKS_SQL: &str = "SELECT * FROM Books;";

/// One column as declared in the live database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type text, e.g. `DECIMAL(10,2)`.
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

impl ColumnInfo {
    /// Whether the store refuses NULL for this column.
    ///
    /// SQLite reports `notnull = 0` for an `INTEGER PRIMARY KEY` rowid alias,
    /// but such a column can never hold NULL.
    pub fn is_required(&self) -> bool {
        self.not_null || self.primary_key
    }
}

/// Runs the `Books` DDL as-is.
///
/// # Errors
/// - `DbError::TableAlreadyExists` when `Books` is already present.
/// - `DbError::Sqlite` for any other store failure.
pub fn create_books_table(conn: &Connection) -> DbResult<()> {
    match conn.execute_batch(CREATE_BOOKS_TABLE_SQL) {
        Ok(()) => {
            info!("event=schema_create module=db status=ok table={BOOKS_TABLE}");
            Ok(())
        }
        Err(err) if is_table_exists_error(&err) => {
            error!(
                "event=schema_create module=db status=error table={BOOKS_TABLE} error_code=table_exists"
            );
            Err(DbError::TableAlreadyExists {
                table: BOOKS_TABLE.to_string(),
            })
        }
        Err(err) => {
            error!(
                "event=schema_create module=db status=error table={BOOKS_TABLE} error_code=ddl_failed error={err}"
            );
            Err(err.into())
        }
    }
}

/// Returns whether `table` exists in the connected database.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns the declared columns of `Books` in declaration order.
///
/// Returns an empty list when the table does not exist.
pub fn books_columns(conn: &Connection) -> DbResult<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", pk
         FROM pragma_table_info(?1)
         ORDER BY cid;",
    )?;
    let rows = stmt.query_map([BOOKS_TABLE], |row| {
        Ok(ColumnInfo {
            name: row.get(0)?,
            declared_type: row.get(1)?,
            not_null: row.get::<_, i64>(2)? != 0,
            primary_key: row.get::<_, i64>(3)? != 0,
        })
    })?;

    let mut columns = Vec::with_capacity(BOOKS_COLUMNS.len());
    for column in rows {
        columns.push(column?);
    }
    Ok(columns)
}

/// Whether `err` is SQLite refusing a `CREATE TABLE` for an existing table.
///
/// Depending on where SQLite fails, rusqlite surfaces this as either
/// `SqliteFailure` or `SqlInputError`; both carry the SQLite message.
pub(crate) fn is_table_exists_error(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::Unknown)
        && err.to_string().contains("already exists")
}

/// Whether the live `Books` columns are exactly `BOOKS_COLUMNS`, in order.
pub fn books_shape_matches(conn: &Connection) -> DbResult<bool> {
    let columns = books_columns(conn)?;
    Ok(columns.len() == BOOKS_COLUMNS.len()
        && columns
            .iter()
            .zip(BOOKS_COLUMNS)
            .all(|(column, expected)| column.name == expected))
}

#[cfg(test)]
mod tests {
    use super::{
        books_columns, books_shape_matches, create_books_table, is_table_exists_error,
        table_exists, BOOKS_COLUMNS, CREATE_BOOKS_TABLE_SQL,
    };
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn create_books_table_on_empty_database_succeeds() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, "Books").unwrap());

        create_books_table(&conn).unwrap();

        assert!(table_exists(&conn, "Books").unwrap());
        let names: Vec<String> = books_columns(&conn)
            .unwrap()
            .into_iter()
            .map(|column| column.name)
            .collect();
        assert_eq!(names, BOOKS_COLUMNS);
    }

    #[test]
    fn create_books_table_twice_reports_table_exists() {
        let conn = Connection::open_in_memory().unwrap();
        create_books_table(&conn).unwrap();

        let err = create_books_table(&conn).unwrap_err();
        assert!(matches!(err, DbError::TableAlreadyExists { ref table } if table == "Books"));
    }

    #[test]
    fn raw_rerun_error_is_recognized_as_table_exists() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CREATE_BOOKS_TABLE_SQL).unwrap();

        let err = conn.execute_batch(CREATE_BOOKS_TABLE_SQL).unwrap_err();
        assert!(is_table_exists_error(&err), "unrecognized error: {err:?}");

        let other = conn.execute_batch("SELECT * FROM Nope;").unwrap_err();
        assert!(!is_table_exists_error(&other));
    }

    #[test]
    fn books_shape_matches_only_the_declared_columns() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!books_shape_matches(&conn).unwrap());

        create_books_table(&conn).unwrap();
        assert!(books_shape_matches(&conn).unwrap());

        let other = Connection::open_in_memory().unwrap();
        other
            .execute_batch("CREATE TABLE Books (Id INTEGER PRIMARY KEY, Name TEXT);")
            .unwrap();
        assert!(!books_shape_matches(&other).unwrap());
    }

    #[test]
    fn books_columns_is_empty_without_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(books_columns(&conn).unwrap().is_empty());
    }
}
