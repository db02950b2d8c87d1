//! Catalog configuration loaded from a TOML file.
//!
//! # Format
//!
//! ```toml
//! [database]
//! data_dir = "./data"          # directory holding the SQLite file
//! name = "DS_Tools_Project"    # database name, file is `<name>.sqlite3`
//! create_if_missing = true     # false: refuse to open a missing database
//!
//! [logging]
//! level = "info"               # trace|debug|info|warn|error
//! dir = "/var/log/books"       # absolute; file logging is off when unset
//! ```
//!
//! # Invariants
//! - A missing config file yields [`CatalogConfig::default`].
//! - `database.name` is non-empty and contains no path separators.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Database selected when no configuration says otherwise.
pub const DEFAULT_DATABASE_NAME: &str = "DS_Tools_Project";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DATABASE_FILE_EXTENSION: &str = "sqlite3";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },
    InvalidDatabaseName(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse {
                path: Some(path),
                source,
            } => write!(f, "invalid config `{}`: {source}", path.display()),
            Self::Parse { path: None, source } => write!(f, "invalid config: {source}"),
            Self::InvalidDatabaseName(name) => write!(
                f,
                "invalid database name `{name}`; expected a non-empty name without path separators"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidDatabaseName(_) => None,
        }
    }
}

/// Top-level catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Where the catalog database lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub data_dir: PathBuf,
    pub name: String,
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            name: DEFAULT_DATABASE_NAME.to_string(),
            create_if_missing: true,
        }
    }
}

/// File logging settings. Both fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

impl CatalogConfig {
    /// Loads configuration from `path`.
    ///
    /// Returns defaults when the file does not exist.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|source| ConfigError::Parse { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        let name = self.database.name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::InvalidDatabaseName(
                self.database.name.clone(),
            ));
        }
        Ok(())
    }

    /// Overrides the data directory, e.g. from a command-line flag.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.database.data_dir = data_dir.into();
        self
    }

    /// Full path of the SQLite file backing the selected database.
    pub fn database_path(&self) -> PathBuf {
        self.database.data_dir.join(format!(
            "{}.{DATABASE_FILE_EXTENSION}",
            self.database.name.trim()
        ))
    }
}
