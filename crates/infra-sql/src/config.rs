// Store Configuration (environment driven)

use crate::dialect::DatabaseKind;
use status_ledger_core::error::{AppError, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://ledger.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

const ENV_DATABASE_URL: &str = "LEDGER_DATABASE_URL";
const ENV_DATABASE_TYPE: &str = "LEDGER_DATABASE_TYPE";
const ENV_MAX_CONNECTIONS: &str = "LEDGER_DB_MAX_CONNECTIONS";

/// Connection settings for the ledger store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_kind: DatabaseKind,
    pub database_url: String,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn new(database_kind: DatabaseKind, database_url: impl Into<String>) -> Self {
        Self {
            database_kind,
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Private in-memory SQLite database (tests, tooling)
    pub fn in_memory() -> Self {
        Self::new(DatabaseKind::Sqlite, "sqlite::memory:")
    }

    /// Load from `LEDGER_DATABASE_URL`, `LEDGER_DATABASE_TYPE` and
    /// `LEDGER_DB_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    ///
    /// The database kind defaults to the URL scheme when no type is given.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup(ENV_DATABASE_URL).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let database_kind = match lookup(ENV_DATABASE_TYPE) {
            Some(kind) if !kind.trim().is_empty() => DatabaseKind::from(kind.as_str()),
            _ => DatabaseKind::from_url(&database_url),
        };

        let max_connections = match lookup(ENV_MAX_CONNECTIONS) {
            Some(raw) => raw.trim().parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                AppError::Config(format!(
                    "{} must be a positive integer, got {:?}",
                    ENV_MAX_CONNECTIONS, raw
                ))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_kind,
            database_url,
            max_connections,
        })
    }

    /// Every connection to `sqlite::memory:` opens its own empty database
    pub fn is_in_memory_sqlite(&self) -> bool {
        self.database_url.starts_with("sqlite:")
            && (self.database_url.contains(":memory:") || self.database_url.contains("mode=memory"))
    }
}
