// Port Layer - Interfaces for the ledger stores

pub mod status_repository;
pub mod webhook_repository;

// Re-exports
pub use status_repository::StatusRepository;
pub use webhook_repository::WebhookRepository;
