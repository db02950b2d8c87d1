//! Core storage and domain logic for the `DS_Tools_Project` book catalog.
//! This crate owns the `Books` schema contract and every access path to it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError, DatabaseConfig, LoggingConfig};
pub use db::schema::{books_columns, create_books_table, ColumnInfo, BOOKS_COLUMNS};
pub use db::{open_catalog, open_db, open_db_in_memory, open_existing_db, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{Book, BookId, Money, NewBook, ParseMoneyError};
pub use model::listing::{parse_availability_text, parse_money_text, parse_star_rating};
pub use repo::book_repo::{
    BookListQuery, BookRepository, RepoError, RepoResult, SqliteBookRepository,
};
pub use service::catalog_service::{summarize, CatalogService, CatalogSummary};
pub use service::csv_export::write_books_csv;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
