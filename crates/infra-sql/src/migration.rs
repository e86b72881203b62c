// Migration Runner

use crate::dialect::{dialect_for, DatabaseKind};
use crate::error::map_sqlx_error;
use sqlx::AnyPool;
use status_ledger_core::error::Result;
use tracing::info;

/// Embedded migrations, applied in order
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "Initial schema",
    include_str!("../migrations/001_initial_schema.sql"),
)];

/// Run database migrations. Already applied versions are skipped.
pub async fn run_migrations(pool: &AnyPool, kind: &DatabaseKind) -> Result<()> {
    info!(database_kind = %kind, "Running database migrations...");

    sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version BIGINT NOT NULL)")
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("migration", e))?;

    let current_version: i64 =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(|e| map_sqlx_error("migration", e))?
            .unwrap_or(0);

    info!("Current schema version: {}", current_version);

    let record_version = format!(
        "INSERT INTO schema_version (version) VALUES ({})",
        dialect_for(kind).placeholder(1)
    );

    for (version, name, sql) in MIGRATIONS {
        if current_version < *version {
            info!("Applying migration {:03}: {}", version, name);
            apply_migration(pool, *version, sql, &record_version).await?;
        }
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Apply a single migration SQL file and record its version
async fn apply_migration(pool: &AnyPool, version: i64, sql: &str, record_version: &str) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| map_sqlx_error("migration begin", e))?;

    // Split by semicolon and execute each statement
    for statement in sql.split(';') {
        // Remove comments and trim
        let clean_statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if !clean_statement.is_empty() {
            sqlx::query(&clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(&format!("migration {:03}", version), e))?;
        }
    }

    sqlx::query(record_version)
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("migration", e))?;

    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("migration commit", e))?;
    Ok(())
}
