// Repository Constructors
//
// The dialect is chosen once, from the declared database kind; unknown
// kinds get the generic dialect.

use crate::dialect::{dialect_for, DatabaseKind};
use crate::status_repository::SqlStatusRepository;
use crate::webhook_repository::SqlWebhookRepository;
use sqlx::AnyPool;
use status_ledger_core::port::{StatusRepository, WebhookRepository};
use std::sync::Arc;
use tracing::debug;

/// Status repository for `database_kind`, sharing `pool`
pub fn get_status_repository(database_kind: &str, pool: AnyPool) -> Arc<dyn StatusRepository> {
    let dialect = dialect_for(&DatabaseKind::from(database_kind));
    debug!(database_kind, dialect = dialect.name(), "Creating status repository");
    Arc::new(SqlStatusRepository::new(pool, dialect))
}

/// Webhook repository for `database_kind`, sharing `pool`
pub fn get_webhook_repository(database_kind: &str, pool: AnyPool) -> Arc<dyn WebhookRepository> {
    let dialect = dialect_for(&DatabaseKind::from(database_kind));
    debug!(database_kind, dialect = dialect.name(), "Creating webhook repository");
    Arc::new(SqlWebhookRepository::new(pool, &*dialect))
}
