// Connection Pool Setup (sqlx Any driver)

use crate::config::StoreConfig;
use crate::error::map_sqlx_error;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use status_ledger_core::error::Result;
use std::time::Duration;
use tracing::info;

/// Create a connection pool for any supported database URL
pub async fn create_pool(config: &StoreConfig) -> Result<AnyPool> {
    install_default_drivers();

    let options = if config.is_in_memory_sqlite() {
        // A second connection, or a recycled one, would see an empty database
        AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
    };

    let pool = options
        .connect(&config.database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    info!(
        database_kind = %config.database_kind,
        max_connections = pool.options().get_max_connections(),
        "Database pool ready"
    );

    Ok(pool)
}
