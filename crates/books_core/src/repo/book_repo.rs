//! Book repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert and read APIs over the `Books` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `list_all_books` runs exactly `SELECT * FROM Books` and keeps store order.
//! - No API updates or deletes rows, so `Id` never changes once assigned.
//! - Writes add no checks beyond the schema: duplicate UPCs and any rating
//!   value are accepted.

use crate::db::schema::{
    books_columns, table_exists, BOOKS_COLUMNS, BOOKS_TABLE, SELECT_ALL_BOOKS_SQL,
};
use crate::db::DbError;
use crate::model::book::{Book, BookId, Money, NewBook};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{
    params_from_iter, Connection, ErrorCode, Row, ToSql, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

const INSERT_BOOK_SQL: &str = "INSERT INTO Books (
    Title,
    Price,
    Rating,
    Availability,
    UPC,
    ProductType,
    PriceExclTax,
    PriceInclTax,
    Tax,
    NumReviews,
    Description
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for book persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(BookId),
    /// The store rejected a write, e.g. a NULL `Title`.
    ConstraintViolation(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "book not found: {id}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted book data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(err, message)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(message.unwrap_or_else(|| err.to_string()))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Filters for browsing the catalog.
///
/// Every filter is optional; the default query matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListQuery {
    /// Substring matched against `Title` or `Description`, ASCII
    /// case-insensitive. Blank text disables the filter.
    pub text: Option<String>,
    /// Accepted `Rating` values. Empty accepts any rating, including NULL.
    pub ratings: Vec<i64>,
    /// Inclusive lower bound on `Price`; rows with NULL price never match.
    pub min_price: Option<Money>,
    /// Inclusive upper bound on `Price`; rows with NULL price never match.
    pub max_price: Option<Money>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for `Books` access.
pub trait BookRepository {
    fn insert_book(&self, book: &NewBook) -> RepoResult<BookId>;
    /// Inserts all rows or none.
    fn insert_books(&self, books: &[NewBook]) -> RepoResult<Vec<BookId>>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    /// Every row, every column, in store-defined order.
    fn list_all_books(&self) -> RepoResult<Vec<Book>>;
    fn count_books(&self) -> RepoResult<u64>;
    /// Filtered rows ordered by `Id`.
    fn search_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when `Books` does not exist.
    /// - `MissingRequiredColumn` when any of its 12 columns is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_books_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn insert_book(&self, book: &NewBook) -> RepoResult<BookId> {
        insert_with(self.conn, book)
    }

    fn insert_books(&self, books: &[NewBook]) -> RepoResult<Vec<BookId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut ids = Vec::with_capacity(books.len());
        for book in books {
            ids.push(insert_with(&tx, book)?);
        }
        tx.commit()?;

        debug!("event=books_insert module=repo status=ok count={}", ids.len());
        Ok(ids)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        let mut stmt = self.conn.prepare("SELECT * FROM Books WHERE Id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_book_row(row)?));
        }

        Ok(None)
    }

    fn list_all_books(&self) -> RepoResult<Vec<Book>> {
        let mut stmt = self.conn.prepare(SELECT_ALL_BOOKS_SQL)?;
        let mut rows = stmt.query([])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }

        Ok(books)
    }

    fn count_books(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Books;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn search_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        let mut sql = String::from("SELECT * FROM Books WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            sql.push_str(" AND (Title LIKE ? ESCAPE '\\' OR Description LIKE ? ESCAPE '\\')");
            let pattern = format!("%{}%", escape_like(text));
            bind_values.push(Value::Text(pattern.clone()));
            bind_values.push(Value::Text(pattern));
        }

        if !query.ratings.is_empty() {
            let placeholders = vec!["?"; query.ratings.len()].join(", ");
            sql.push_str(&format!(" AND Rating IN ({placeholders})"));
            bind_values.extend(query.ratings.iter().map(|rating| Value::Integer(*rating)));
        }

        if let Some(min_price) = query.min_price {
            sql.push_str(" AND Price >= ?");
            bind_values.push(Value::Real(min_price.to_f64()));
        }

        if let Some(max_price) = query.max_price {
            sql.push_str(" AND Price <= ?");
            bind_values.push(Value::Real(max_price.to_f64()));
        }

        sql.push_str(" ORDER BY Id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }

        Ok(books)
    }
}

fn insert_with(conn: &Connection, book: &NewBook) -> RepoResult<BookId> {
    let values: [&dyn ToSql; 11] = [
        &book.title,
        &book.price,
        &book.rating,
        &book.availability,
        &book.upc,
        &book.product_type,
        &book.price_excl_tax,
        &book.price_incl_tax,
        &book.tax,
        &book.num_reviews,
        &book.description,
    ];
    conn.execute(INSERT_BOOK_SQL, &values[..])?;
    Ok(BookId(conn.last_insert_rowid()))
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let id: BookId = row.get("Id")?;
    let title: Option<String> = row.get("Title")?;
    let title = title.ok_or_else(|| {
        RepoError::InvalidData(format!("NULL title in Books.Title for id {id}"))
    })?;

    Ok(Book {
        id,
        title,
        price: row.get("Price")?,
        rating: row.get("Rating")?,
        availability: row.get("Availability")?,
        upc: row.get("UPC")?,
        product_type: row.get("ProductType")?,
        price_excl_tax: row.get("PriceExclTax")?,
        price_incl_tax: row.get("PriceInclTax")?,
        tax: row.get("Tax")?,
        num_reviews: row.get("NumReviews")?,
        description: row.get("Description")?,
    })
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn ensure_books_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, BOOKS_TABLE)? {
        return Err(RepoError::MissingRequiredTable(BOOKS_TABLE));
    }

    let present = books_columns(conn)?;
    for column in BOOKS_COLUMNS {
        if !present.iter().any(|info| info.name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: BOOKS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{escape_like, RepoError, SqliteBookRepository};
    use rusqlite::Connection;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn try_new_rejects_connection_without_books_table() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteBookRepository::try_new(&conn).err().unwrap();
        assert!(matches!(err, RepoError::MissingRequiredTable("Books")));
    }

    #[test]
    fn try_new_rejects_table_missing_a_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE Books (Id INTEGER PRIMARY KEY, Title TEXT NOT NULL);")
            .unwrap();

        let err = SqliteBookRepository::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            RepoError::MissingRequiredColumn {
                table: "Books",
                column: "Price"
            }
        ));
    }

    #[test]
    fn sqlite_constraint_failures_map_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT NOT NULL);").unwrap();
        let raw = conn
            .execute("INSERT INTO t (v) VALUES (NULL);", [])
            .unwrap_err();

        let err = RepoError::from(raw);
        assert!(matches!(err, RepoError::ConstraintViolation(ref message) if message.contains("NOT NULL")));
    }
}
