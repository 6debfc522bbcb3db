//! Configuration for SQL MCP Server
//!
//! Settings come from a TOML file, then environment variables override
//! individual values:
//!
//! ```toml
//! [database]
//! backend = "postgres"   # or "sqlite"
//! timeout_secs = 30
//!
//! [database.postgres]
//! host = "localhost"
//! port = 5432
//! database = "postgres"
//! user = "postgres"
//! password = ""
//!
//! [database.sqlite]
//! path = "database.db"
//!
//! [output]
//! character_limit = 25000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default character budget for formatted results
pub const DEFAULT_CHARACTER_LIMIT: usize = 25_000;

/// Configuration problems detected after loading
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("output.character_limit must be greater than zero")]
    ZeroCharacterLimit,

    #[error("database.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("database.postgres.min_connections ({min}) exceeds max_connections ({max})")]
    PoolBounds { min: u32, max: u32 },
}

/// Which driver serves queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Sqlite,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "sqlite" => Ok(Backend::Sqlite),
            _ => Err(()),
        }
    }
}

/// SQL MCP configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Database connection settings
    pub database: DatabaseConfig,

    /// Result rendering settings
    pub output: OutputConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: Backend,

    /// Bound on pool acquisition and statement execution, in seconds
    pub timeout_secs: u64,

    pub postgres: PostgresConfig,

    pub sqlite: SqliteConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            timeout_secs: 30,
            postgres: PostgresConfig::default(),
            sqlite: SqliteConfig::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// PostgreSQL connection parameters
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            min_connections: 2,
            max_connections: 10,
        }
    }
}

// Keeps the password out of logs
impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("min_connections", &self.min_connections)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// SQLite database location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database.db"),
        }
    }
}

/// Output rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Maximum characters of rendered rows before truncation
    pub character_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            character_limit: DEFAULT_CHARACTER_LIMIT,
        }
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

impl SqlConfig {
    /// Load configuration from file and environment
    ///
    /// Looks for config in:
    /// 1. `SQL_CONFIG_PATH` environment variable (must exist)
    /// 2. `$XDG_CONFIG_HOME/sql-mcp/config.toml`
    /// 3. Built-in defaults
    ///
    /// Environment overrides are applied afterwards, then the result is validated.
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(path) = std::env::var("SQL_CONFIG_PATH") {
            Self::from_file(Path::new(&path))?
        } else {
            match dirs::config_dir().map(|d| d.join("sql-mcp").join("config.toml")) {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    tracing::info!("No config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))?;

        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Override settings from environment-style variables
    ///
    /// `lookup` returns the value of a variable, if set.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("SQL_BACKEND") {
            self.database.backend = v.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "SQL_BACKEND",
                value: v,
            })?;
        }
        if let Some(v) = lookup("SQL_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("SQL_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("SQL_CHARACTER_LIMIT") {
            self.output.character_limit = parse_env("SQL_CHARACTER_LIMIT", v)?;
        }

        let pg = &mut self.database.postgres;
        if let Some(v) = lookup("POSTGRES_HOST") {
            pg.host = v;
        }
        if let Some(v) = lookup("POSTGRES_PORT") {
            pg.port = parse_env("POSTGRES_PORT", v)?;
        }
        if let Some(v) = lookup("POSTGRES_DB") {
            pg.database = v;
        }
        if let Some(v) = lookup("POSTGRES_USER") {
            pg.user = v;
        }
        if let Some(v) = lookup("POSTGRES_PASSWORD") {
            pg.password = v;
        }

        if let Some(v) = lookup("SQLITE_PATH") {
            self.database.sqlite.path = PathBuf::from(v);
        }

        Ok(())
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.character_limit == 0 {
            return Err(ConfigError::ZeroCharacterLimit);
        }
        if self.database.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let pg = &self.database.postgres;
        if pg.min_connections > pg.max_connections {
            return Err(ConfigError::PoolBounds {
                min: pg.min_connections,
                max: pg.max_connections,
            });
        }
        Ok(())
    }

    /// Create a config serving a specific SQLite file
    pub fn with_sqlite(path: PathBuf) -> Self {
        let mut config = Self::default();
        config.database.backend = Backend::Sqlite;
        config.database.sqlite.path = path;
        config
    }
}
