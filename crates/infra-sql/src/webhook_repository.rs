// SQL WebhookRepository Implementation

use crate::dialect::Dialect;
use crate::error::map_sqlx_error;
use crate::query::WebhookQueries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::AnyPool;
use status_ledger_core::error::Result;
use status_ledger_core::port::WebhookRepository;
use tracing::debug;

pub struct SqlWebhookRepository {
    pool: AnyPool,
    queries: WebhookQueries,
}

impl SqlWebhookRepository {
    pub fn new(pool: AnyPool, dialect: &dyn Dialect) -> Self {
        Self {
            pool,
            queries: WebhookQueries::new(dialect),
        }
    }
}

#[async_trait]
impl WebhookRepository for SqlWebhookRepository {
    async fn record_attempt(
        &self,
        watch_id: &str,
        attempted_at: DateTime<Utc>,
        status_code: i32,
    ) -> Result<()> {
        // Single statement, no fallback branch: no transaction
        sqlx::query(&self.queries.insert)
            .bind(watch_id)
            .bind(attempted_at.timestamp_millis())
            .bind(i64::from(status_code))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("record_attempt", e))?;

        debug!(watch_id, status_code, "Recorded webhook attempt");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
