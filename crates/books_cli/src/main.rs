//! `books` command-line entry point.
//!
//! # Responsibility
//! - Select the catalog database from config and flags.
//! - Expose schema bootstrap and read paths as subcommands.
//!
//! # Usage
//!
//! ```bash
//! books init
//! books --data-dir /srv/books list
//! books search --text attic --rating 3 --max-price 55.00
//! books summary
//! books export --output books.csv
//! ```

use books_core::{
    books_columns, core_version, default_log_level, init_logging, open_catalog, write_books_csv,
    BookId, BookListQuery, CatalogConfig, CatalogService, Money, SqliteBookRepository,
};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Inspect the DS_Tools_Project book catalog.
#[derive(Parser, Debug)]
#[command(name = "books", version, long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when it does not exist
    #[arg(short = 'c', long = "config", default_value = "books.toml")]
    config: PathBuf,

    /// Directory holding the database file (overrides config)
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Absolute directory for log files (overrides config)
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database if needed and apply the schema
    Init,
    /// Print the declared columns of `Books`
    Columns,
    /// Run `SELECT * FROM Books`, one JSON object per row
    List,
    /// Print one book by id
    Show { id: i64 },
    /// Filter books by text, rating and price
    Search {
        /// Substring of title or description
        #[arg(long)]
        text: Option<String>,
        /// Accepted rating; repeat for several
        #[arg(long = "rating")]
        ratings: Vec<i64>,
        #[arg(long)]
        min_price: Option<Money>,
        #[arg(long)]
        max_price: Option<Money>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Print catalog summary statistics as JSON
    Summary,
    /// Write every row as CSV with a header row
    Export {
        /// Destination file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = resolve_config(&cli)?;
    start_logging(&cli, &config)?;

    let conn = open_catalog(&config)?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Init => {
            let version = books_core::db::migrations::schema_version(&conn)?;
            writeln!(
                out,
                "database={} schema_version={version}",
                config.database_path().display()
            )?;
        }
        Command::Columns => {
            for column in books_columns(&conn)? {
                let nullability = if column.is_required() {
                    "NOT NULL"
                } else {
                    "NULL"
                };
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    column.name, column.declared_type, nullability
                )?;
            }
        }
        Command::List => {
            let service = CatalogService::new(SqliteBookRepository::try_new(&conn)?);
            for book in service.all_books()? {
                writeln!(out, "{}", serde_json::to_string(&book)?)?;
            }
        }
        Command::Show { id } => {
            let service = CatalogService::new(SqliteBookRepository::try_new(&conn)?);
            let book = service.require_book(BookId(id))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&book)?)?;
        }
        Command::Search {
            text,
            ratings,
            min_price,
            max_price,
            limit,
            offset,
        } => {
            let service = CatalogService::new(SqliteBookRepository::try_new(&conn)?);
            let query = BookListQuery {
                text,
                ratings,
                min_price,
                max_price,
                limit,
                offset,
            };
            for book in service.explore(&query)? {
                writeln!(out, "{}", serde_json::to_string(&book)?)?;
            }
        }
        Command::Summary => {
            let service = CatalogService::new(SqliteBookRepository::try_new(&conn)?);
            let summary = service.summary()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
        Command::Export { output } => {
            let service = CatalogService::new(SqliteBookRepository::try_new(&conn)?);
            let books = service.all_books()?;
            match output {
                Some(path) => {
                    write_books_csv(&books, std::fs::File::create(&path)?)?;
                }
                None => {
                    write_books_csv(&books, &mut out)?;
                }
            }
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> CliResult<CatalogConfig> {
    let mut config = CatalogConfig::load(&cli.config)?;
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(log_dir) = &cli.log_dir {
        config.logging.dir = Some(log_dir.clone());
    }
    Ok(config)
}

fn start_logging(cli: &Cli, config: &CatalogConfig) -> CliResult<()> {
    let Some(log_dir) = &config.logging.dir else {
        return Ok(());
    };
    let level = config
        .logging
        .level
        .as_deref()
        .unwrap_or(default_log_level());
    init_logging(level, log_dir)?;
    info!(
        "event=cli_start module=cli status=ok core_version={} config={}",
        core_version(),
        cli.config.display()
    );
    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Init => "init",
        Command::Columns => "columns",
        Command::List => "list",
        Command::Show { .. } => "show",
        Command::Search { .. } => "search",
        Command::Summary => "summary",
        Command::Export { .. } => "export",
    }
}
