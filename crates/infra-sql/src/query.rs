// Query Construction
//
// Built once per repository. Bind order is part of each statement's contract.

use crate::dialect::{placeholder_list, Dialect};

/// Statements of the company status ledger
#[derive(Debug, Clone)]
pub(crate) struct StatusQueries {
    /// binds: company_id
    pub latest: String,
    /// binds: company_id, user_id, note, status, created_at
    pub insert: String,
    /// binds: note, status, company_id, user_id
    pub update: String,
}

impl StatusQueries {
    pub(crate) fn new(dialect: &dyn Dialect) -> Self {
        let latest = format!(
            "SELECT user_id, note, status, created_at FROM company_status \
             WHERE company_id = {} AND deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT 1",
            dialect.placeholder(1)
        );

        let insert = format!(
            "INSERT INTO company_status (company_id, user_id, note, status, created_at) \
             VALUES ({})",
            placeholder_list(dialect, 1, 5)
        );

        // created_at is never rewritten
        let update = format!(
            "UPDATE company_status SET note = {}, status = {} \
             WHERE company_id = {} AND user_id = {}",
            dialect.placeholder(1),
            dialect.placeholder(2),
            dialect.placeholder(3),
            dialect.placeholder(4)
        );

        Self {
            latest,
            insert,
            update,
        }
    }
}

/// Statements of the webhook attempt ledger
#[derive(Debug, Clone)]
pub(crate) struct WebhookQueries {
    /// binds: watch_id, attempted_at, status
    pub insert: String,
}

impl WebhookQueries {
    pub(crate) fn new(dialect: &dyn Dialect) -> Self {
        Self {
            insert: format!(
                "INSERT INTO webhook_stats (watch_id, attempted_at, status) VALUES ({})",
                placeholder_list(dialect, 1, 3)
            ),
        }
    }
}
