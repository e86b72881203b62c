// Status Ledger Core - Domain Types & Ports
// NO infrastructure dependencies (hexagonal architecture)

pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
