// Status Repository Port (Interface)

use crate::domain::StatusRecord;
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for the company status ledger
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Most recent visible status for a company.
    ///
    /// `Ok(None)` when the company has no live row; an empty `company_id`
    /// fails with `InvalidArgument`.
    async fn get_latest_status(&self, company_id: &str) -> Result<Option<StatusRecord>>;

    /// Insert a status for `(company_id, status.user_id)`, or rewrite the
    /// note and status of the existing row when the pair is already taken.
    ///
    /// Runs as one atomic unit. Callers cannot tell an insert from an update.
    async fn upsert_status(&self, company_id: &str, status: &StatusRecord) -> Result<()>;

    /// Release the underlying pool. The repository is unusable afterwards.
    async fn close(&self) -> Result<()>;
}
