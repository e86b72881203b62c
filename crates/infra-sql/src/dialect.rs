// SQL Dialects
//
// The repositories share one orchestration routine; a dialect only decides
// placeholder text, how a unique violation is recognized, and whether a
// transaction survives a failed statement.

use sqlx::error::ErrorKind;
use std::fmt;
use std::sync::Arc;

/// Declared database kind, parsed from configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    Postgres,
    MySql,
    Sqlite,
    Other(String),
}

impl DatabaseKind {
    /// Infer the kind from a connection URL scheme
    pub fn from_url(url: &str) -> Self {
        let scheme = url.split(':').next().unwrap_or_default();
        DatabaseKind::from(scheme)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DatabaseKind::Postgres => "postgres",
            DatabaseKind::MySql => "mysql",
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for DatabaseKind {
    fn from(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseKind::Postgres,
            "mysql" => DatabaseKind::MySql,
            "sqlite" | "sqlite3" => DatabaseKind::Sqlite,
            other => DatabaseKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the upsert does after its insert hits a unique violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// The failed statement is rolled back alone; run the update in the
    /// same transaction.
    SameTransaction,
    /// The store aborts the whole transaction on any error; roll back and
    /// run the update in a new one.
    FreshTransaction,
}

/// SQL dialect: placeholder syntax and error encoding
pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Bind placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String;

    /// Did this statement fail on a uniqueness constraint?
    fn is_unique_violation(&self, err: &sqlx::Error) -> bool;

    fn conflict_strategy(&self) -> ConflictStrategy;
}

/// `?` placeholders (SQLite, MySQL and anything unrecognized)
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn is_unique_violation(&self, err: &sqlx::Error) -> bool {
        // SQLite: 2067 SQLITE_CONSTRAINT_UNIQUE, 1555 SQLITE_CONSTRAINT_PRIMARYKEY
        // MySQL reports SQLSTATE 23000 for every integrity error, so it is
        // only recognized through the driver's error kind (errno 1062)
        database_error_matches(err, &["2067", "1555"])
    }

    fn conflict_strategy(&self) -> ConflictStrategy {
        ConflictStrategy::SameTransaction
    }
}

/// `$n` placeholders, SQLSTATE error codes
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn is_unique_violation(&self, err: &sqlx::Error) -> bool {
        // 23505 unique_violation
        database_error_matches(err, &["23505"])
    }

    fn conflict_strategy(&self) -> ConflictStrategy {
        // Anything after a failed statement gets 25P02 in_failed_sql_transaction
        ConflictStrategy::FreshTransaction
    }
}

fn database_error_matches(err: &sqlx::Error, unique_codes: &[&str]) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.kind() == ErrorKind::UniqueViolation
                || db_err
                    .code()
                    .is_some_and(|code| unique_codes.iter().any(|c| code == *c))
        }
        _ => false,
    }
}

/// Dialect registry: PostgreSQL is distinguished, every other kind is generic
pub fn dialect_for(kind: &DatabaseKind) -> Arc<dyn Dialect> {
    match kind {
        DatabaseKind::Postgres => Arc::new(PostgresDialect),
        DatabaseKind::MySql | DatabaseKind::Sqlite | DatabaseKind::Other(_) => {
            Arc::new(GenericDialect)
        }
    }
}

/// Comma separated placeholders `first..first + count`
pub(crate) fn placeholder_list(dialect: &dyn Dialect, first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| dialect.placeholder(i))
        .collect::<Vec<_>>()
        .join(", ")
}
