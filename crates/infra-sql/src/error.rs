// sqlx::Error -> AppError mapping
//
// sqlx::Error cannot cross into core (orphan rules, and core stays driver
// free), so every failure is rendered to AppError::Storage here.

use sqlx::error::ErrorKind;
use status_ledger_core::error::AppError;

/// Convert a sqlx error to a storage error prefixed with the operation name
pub(crate) fn map_sqlx_error(op: &str, err: sqlx::Error) -> AppError {
    AppError::Storage(format!("{}: {}", op, describe(&err)))
}

/// Human readable rendering that keeps the driver code when there is one
pub(crate) fn describe(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => {
            let kind = match db_err.kind() {
                ErrorKind::UniqueViolation => "unique constraint violation",
                ErrorKind::ForeignKeyViolation => "foreign key constraint violation",
                ErrorKind::NotNullViolation | ErrorKind::CheckViolation => "constraint violation",
                _ => "database error",
            };

            match db_err.code() {
                Some(code) => format!("{} [{}]: {}", kind, code, db_err.message()),
                None => format!("{}: {}", kind, db_err.message()),
            }
        }
        sqlx::Error::RowNotFound => "row not found".to_string(),
        sqlx::Error::ColumnNotFound(col) => format!("column not found: {}", col),
        sqlx::Error::PoolClosed => "connection pool is closed".to_string(),
        sqlx::Error::PoolTimedOut => "timed out acquiring a connection".to_string(),
        // Connection, protocol, decode errors
        _ => err.to_string(),
    }
}
