// Webhook Repository Port (Interface)

use crate::domain::WebhookAttempt;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Append-only ledger of webhook delivery attempts
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// Append one attempt. There is no conflict or update path.
    async fn record_attempt(
        &self,
        watch_id: &str,
        attempted_at: DateTime<Utc>,
        status_code: i32,
    ) -> Result<()>;

    /// Release the underlying pool. The repository is unusable afterwards.
    async fn close(&self) -> Result<()>;
}

/// Convenience for callers holding a `WebhookAttempt` value
pub async fn record(repo: &dyn WebhookRepository, attempt: &WebhookAttempt) -> Result<()> {
    repo.record_attempt(&attempt.watch_id, attempt.attempted_at, attempt.status_code)
        .await
}
