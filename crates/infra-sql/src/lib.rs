// Status Ledger Infrastructure - SQL Adapter (sqlx Any driver)
// Implements: StatusRepository, WebhookRepository for SQLite, MySQL, PostgreSQL

mod config;
mod connection;
mod dialect;
mod error;
mod factory;
mod migration;
mod query;
mod status_repository;
mod webhook_repository;

pub use config::StoreConfig;
pub use connection::create_pool;
pub use dialect::{dialect_for, ConflictStrategy, DatabaseKind, Dialect, GenericDialect, PostgresDialect};
pub use factory::{get_status_repository, get_webhook_repository};
pub use migration::run_migrations;
pub use status_repository::{SqlStatusRepository, MAX_UPSERT_ATTEMPTS};
pub use webhook_repository::SqlWebhookRepository;

// Re-exported so callers can hold a pool without naming sqlx
pub use sqlx::AnyPool;
