// SQL StatusRepository Implementation

use crate::dialect::{ConflictStrategy, Dialect};
use crate::error::{describe, map_sqlx_error};
use crate::query::StatusQueries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::any::AnyQueryResult;
use sqlx::{Any, AnyPool, Transaction};
use status_ledger_core::domain::{StatusRecord, StatusValue};
use status_ledger_core::error::{require_key, AppError, Result};
use status_ledger_core::port::StatusRepository;
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on transactions a single upsert may open
pub const MAX_UPSERT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpsertStep {
    Insert,
    Update,
}

pub struct SqlStatusRepository {
    pool: AnyPool,
    dialect: Arc<dyn Dialect>,
    queries: StatusQueries,
}

impl SqlStatusRepository {
    pub fn new(pool: AnyPool, dialect: Arc<dyn Dialect>) -> Self {
        let queries = StatusQueries::new(dialect.as_ref());
        Self {
            pool,
            dialect,
            queries,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    async fn begin(&self) -> Result<Transaction<'static, Any>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("upsert_status: begin failed", e))
    }

    async fn insert(
        &self,
        tx: &mut Transaction<'static, Any>,
        company_id: &str,
        status: &StatusRecord,
    ) -> std::result::Result<AnyQueryResult, sqlx::Error> {
        sqlx::query(&self.queries.insert)
            .bind(company_id)
            .bind(status.user_id.as_str())
            .bind(status.note.as_deref())
            .bind(status.status.as_str())
            .bind(status.created_at.timestamp_millis())
            .execute(&mut **tx)
            .await
    }

    async fn update(
        &self,
        tx: &mut Transaction<'static, Any>,
        company_id: &str,
        status: &StatusRecord,
    ) -> std::result::Result<AnyQueryResult, sqlx::Error> {
        sqlx::query(&self.queries.update)
            .bind(status.note.as_deref())
            .bind(status.status.as_str())
            .bind(company_id)
            .bind(status.user_id.as_str())
            .execute(&mut **tx)
            .await
    }
}

/// Commit, mapping failure to a storage error
async fn commit(tx: Transaction<'static, Any>, step: UpsertStep) -> Result<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error(&format!("upsert_status: {} commit", step.label()), e))
}

/// Roll back after `err` and report both outcomes in one storage error
async fn rollback_with(tx: Transaction<'static, Any>, context: &str, err: &sqlx::Error) -> AppError {
    let rollback = match tx.rollback().await {
        Ok(()) => "ok".to_string(),
        Err(rollback_err) => {
            warn!(error = %rollback_err, context, "Rollback failed");
            describe(&rollback_err)
        }
    };
    AppError::Storage(format!(
        "upsert_status: {} error={} rollback={}",
        context,
        describe(err),
        rollback
    ))
}

impl UpsertStep {
    fn label(self) -> &'static str {
        match self {
            UpsertStep::Insert => "insert",
            UpsertStep::Update => "update",
        }
    }
}

#[async_trait]
impl StatusRepository for SqlStatusRepository {
    async fn get_latest_status(&self, company_id: &str) -> Result<Option<StatusRecord>> {
        require_key("company_id", company_id)?;

        // No matching row is Ok(None), not an error
        let row = sqlx::query_as::<_, StatusRow>(&self.queries.latest)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_latest_status", e))?;

        row.map(StatusRow::into_record).transpose()
    }

    async fn upsert_status(&self, company_id: &str, status: &StatusRecord) -> Result<()> {
        require_key("company_id", company_id)?;

        let strategy = self.dialect.conflict_strategy();
        let mut step = UpsertStep::Insert;

        for attempt in 1..=MAX_UPSERT_ATTEMPTS {
            let mut tx = self.begin().await?;

            if step == UpsertStep::Insert {
                match self.insert(&mut tx, company_id, status).await {
                    Ok(_) => {
                        debug!(company_id, user_id = %status.user_id, "Inserted company status");
                        return commit(tx, step).await;
                    }
                    Err(err) if self.dialect.is_unique_violation(&err) => {
                        debug!(
                            company_id,
                            user_id = %status.user_id,
                            dialect = self.dialect.name(),
                            "Status already present, updating instead"
                        );
                        step = UpsertStep::Update;
                        if strategy == ConflictStrategy::FreshTransaction {
                            tx.rollback().await.map_err(|e| {
                                AppError::Storage(format!(
                                    "upsert_status: insert error={} rollback={}",
                                    describe(&err),
                                    describe(&e)
                                ))
                            })?;
                            continue;
                        }
                    }
                    Err(err) => return Err(rollback_with(tx, "insert", &err).await),
                }
            }

            match self.update(&mut tx, company_id, status).await {
                Ok(result)
                    if result.rows_affected() == 0
                        && strategy == ConflictStrategy::FreshTransaction =>
                {
                    // Conflicting row disappeared between the two transactions
                    warn!(company_id, user_id = %status.user_id, attempt, "Update matched no row, retrying insert");
                    tx.rollback()
                        .await
                        .map_err(|e| map_sqlx_error("upsert_status: update rollback", e))?;
                    step = UpsertStep::Insert;
                }
                Ok(_) => {
                    debug!(company_id, user_id = %status.user_id, "Updated company status");
                    return commit(tx, step).await;
                }
                Err(err) => return Err(rollback_with(tx, "update", &err).await),
            }
        }

        Err(AppError::Storage(format!(
            "upsert_status: no commit after {} attempts",
            MAX_UPSERT_ATTEMPTS
        )))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// company_status row as selected by the latest-status query
#[derive(Debug, sqlx::FromRow)]
struct StatusRow {
    user_id: String,
    note: Option<String>,
    status: String,
    created_at: i64, // epoch ms
}

impl StatusRow {
    fn into_record(self) -> Result<StatusRecord> {
        let created_at = DateTime::<Utc>::from_timestamp_millis(self.created_at).ok_or_else(|| {
            AppError::Storage(format!(
                "get_latest_status: created_at out of range: {}",
                self.created_at
            ))
        })?;

        Ok(StatusRecord {
            user_id: self.user_id,
            note: self.note,
            status: StatusValue::from(self.status),
            created_at,
            deleted_at: None, // query only returns live rows
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{dialect_for, DatabaseKind, GenericDialect, PostgresDialect};
    use crate::{create_pool, run_migrations, StoreConfig};

    async fn setup_test_db() -> AnyPool {
        let pool = create_pool(&StoreConfig::in_memory()).await.unwrap();
        run_migrations(&pool, &DatabaseKind::Sqlite).await.unwrap();
        pool
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    async fn row_count(pool: &AnyPool, company_id: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM company_status WHERE company_id = ?")
            .bind(company_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    // Both dialects run against SQLite, which also accepts $n placeholders
    fn dialects() -> Vec<Arc<dyn Dialect>> {
        vec![Arc::new(GenericDialect), Arc::new(PostgresDialect)]
    }

    #[tokio::test]
    async fn test_missing_company_is_not_an_error() {
        let pool = setup_test_db().await;
        let repo = SqlStatusRepository::new(pool, Arc::new(GenericDialect));

        let found = repo.get_latest_status("nobody").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_empty_company_id_rejected() {
        let pool = setup_test_db().await;
        let repo = SqlStatusRepository::new(pool.clone(), Arc::new(GenericDialect));

        let err = repo.get_latest_status("").await.unwrap_err();
        assert!(err.is_invalid_argument());

        let record = StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000));
        let err = repo.upsert_status("", &record).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(row_count(&pool, "").await, 0);
    }

    #[tokio::test]
    async fn test_insert_then_read() {
        for dialect in dialects() {
            let pool = setup_test_db().await;
            let repo = SqlStatusRepository::new(pool.clone(), dialect);

            let record = StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000)).with_note("flag");
            repo.upsert_status("company-1", &record).await.unwrap();

            assert_eq!(row_count(&pool, "company-1").await, 1);
            let found = repo.get_latest_status("company-1").await.unwrap().unwrap();
            assert_eq!(found, record);
        }
    }

    #[tokio::test]
    async fn test_conflict_updates_in_place() {
        for dialect in dialects() {
            let pool = setup_test_db().await;
            let name = dialect.name();
            let repo = SqlStatusRepository::new(pool.clone(), dialect);

            let first = StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000)).with_note("flag");
            repo.upsert_status("company-1", &first).await.unwrap();

            let second = StatusRecord::new("user-1", "ok", at(2_000)).with_note("cleared");
            repo.upsert_status("company-1", &second).await.unwrap();

            assert_eq!(row_count(&pool, "company-1").await, 1, "dialect {}", name);
            let found = repo.get_latest_status("company-1").await.unwrap().unwrap();
            assert_eq!(found.note.as_deref(), Some("cleared"));
            assert_eq!(found.status, StatusValue::Other("ok".to_string()));
            assert_eq!(found.created_at, at(1_000), "created_at must not move");
        }
    }

    #[tokio::test]
    async fn test_latest_by_created_at_not_insertion_order() {
        let pool = setup_test_db().await;
        let repo = SqlStatusRepository::new(pool, Arc::new(GenericDialect));

        let newer = StatusRecord::new("user-2", StatusValue::Exception, at(5_000));
        let older = StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000));
        repo.upsert_status("company-1", &newer).await.unwrap();
        repo.upsert_status("company-1", &older).await.unwrap();

        let found = repo.get_latest_status("company-1").await.unwrap().unwrap();
        assert_eq!(found.user_id, "user-2");
        assert_eq!(found.status, StatusValue::Exception);
    }

    #[tokio::test]
    async fn test_soft_deleted_rows_are_invisible() {
        let pool = setup_test_db().await;
        let repo = SqlStatusRepository::new(pool.clone(), Arc::new(GenericDialect));

        repo.upsert_status("company-1", &StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000)))
            .await
            .unwrap();
        repo.upsert_status("company-1", &StatusRecord::new("user-2", StatusValue::Cleared, at(2_000)))
            .await
            .unwrap();

        sqlx::query("UPDATE company_status SET deleted_at = ? WHERE user_id = ?")
            .bind(3_000_i64)
            .bind("user-2")
            .execute(&pool)
            .await
            .unwrap();

        let found = repo.get_latest_status("company-1").await.unwrap().unwrap();
        assert_eq!(found.user_id, "user-1");
        assert!(found.is_visible());
    }

    #[tokio::test]
    async fn test_insert_failure_rolls_back() {
        let pool = setup_test_db().await;
        sqlx::query(
            "CREATE TRIGGER reject_insert BEFORE INSERT ON company_status \
             BEGIN SELECT RAISE(ABORT, 'insert rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let repo = SqlStatusRepository::new(pool.clone(), dialect_for(&DatabaseKind::Sqlite));
        let err = repo
            .upsert_status("company-1", &StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000)))
            .await
            .unwrap_err();

        assert!(err.is_storage());
        let message = err.to_string();
        assert!(message.contains("insert rejected"), "{}", message);
        assert!(message.contains("rollback=ok"), "{}", message);
        assert_eq!(row_count(&pool, "company-1").await, 0);
    }

    #[tokio::test]
    async fn test_update_failure_preserves_original_row() {
        for dialect in dialects() {
            let pool = setup_test_db().await;
            let repo = SqlStatusRepository::new(pool.clone(), dialect);

            let original = StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000)).with_note("flag");
            repo.upsert_status("company-1", &original).await.unwrap();

            sqlx::query(
                "CREATE TRIGGER reject_update BEFORE UPDATE ON company_status \
                 BEGIN SELECT RAISE(ABORT, 'update rejected'); END",
            )
            .execute(&pool)
            .await
            .unwrap();

            let correction = StatusRecord::new("user-1", StatusValue::Cleared, at(2_000)).with_note("ok");
            let err = repo.upsert_status("company-1", &correction).await.unwrap_err();

            assert!(err.is_storage());
            let message = err.to_string();
            assert!(message.contains("update error="), "{}", message);
            assert!(message.contains("rollback=ok"), "{}", message);

            assert_eq!(row_count(&pool, "company-1").await, 1);
            let found = repo.get_latest_status("company-1").await.unwrap().unwrap();
            assert_eq!(found, original);
        }
    }

    #[tokio::test]
    async fn test_update_matching_no_row() {
        for dialect in dialects() {
            let pool = setup_test_db().await;
            let strategy = dialect.conflict_strategy();
            let repo = SqlStatusRepository::new(pool.clone(), dialect);

            let original = StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000)).with_note("flag");
            repo.upsert_status("company-1", &original).await.unwrap();

            // Update silently skips every row: rows_affected() == 0
            sqlx::query(
                "CREATE TRIGGER skip_update BEFORE UPDATE ON company_status \
                 BEGIN SELECT RAISE(IGNORE); END",
            )
            .execute(&pool)
            .await
            .unwrap();

            let correction = StatusRecord::new("user-1", StatusValue::Cleared, at(2_000)).with_note("ok");
            let result = repo.upsert_status("company-1", &correction).await;

            match strategy {
                // insert conflicts, update finds nothing, insert conflicts again, budget spent
                ConflictStrategy::FreshTransaction => {
                    let err = result.unwrap_err();
                    assert!(err.is_storage());
                    assert_eq!(
                        err.to_string(),
                        format!(
                            "Storage error: upsert_status: no commit after {} attempts",
                            MAX_UPSERT_ATTEMPTS
                        )
                    );
                }
                // same transaction commits whatever the update touched
                ConflictStrategy::SameTransaction => result.unwrap(),
            }

            assert_eq!(row_count(&pool, "company-1").await, 1);
            let found = repo.get_latest_status("company-1").await.unwrap().unwrap();
            assert_eq!(found, original);
        }
    }

    #[tokio::test]
    async fn test_unique_violation_is_recognized() {
        let pool = setup_test_db().await;
        let insert = "INSERT INTO company_status (company_id, user_id, status, created_at) \
                      VALUES ('company-1', 'user-1', 'unsafe', 1)";
        sqlx::query(insert).execute(&pool).await.unwrap();
        let err = sqlx::query(insert).execute(&pool).await.unwrap_err();

        assert!(GenericDialect.is_unique_violation(&err));
        assert!(PostgresDialect.is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_closed_repository_fails() {
        let pool = setup_test_db().await;
        let repo = SqlStatusRepository::new(pool, Arc::new(GenericDialect));
        repo.close().await.unwrap();

        let err = repo.get_latest_status("company-1").await.unwrap_err();
        assert!(err.is_storage());

        let err = repo
            .upsert_status("company-1", &StatusRecord::new("user-1", StatusValue::Unsafe, at(1_000)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("begin failed"), "{}", err);
    }
}
