// Domain Layer - Ledger records

pub mod status;
pub mod webhook;

// Re-exports
pub use status::{StatusRecord, StatusValue, UserId};
pub use webhook::{WatchId, WebhookAttempt};
