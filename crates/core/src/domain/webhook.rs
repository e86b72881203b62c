// Webhook Delivery Attempt Domain Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Watch (subscription) identifier
pub type WatchId = String;

/// One delivery attempt of an outbound notification. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAttempt {
    pub watch_id: WatchId,
    pub attempted_at: DateTime<Utc>,
    pub status_code: i32, // outcome of the attempt, opaque to the ledger
}

impl WebhookAttempt {
    pub fn new(watch_id: impl Into<String>, attempted_at: DateTime<Utc>, status_code: i32) -> Self {
        Self {
            watch_id: watch_id.into(),
            attempted_at,
            status_code,
        }
    }
}
