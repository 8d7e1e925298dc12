use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type that captures ledger, reminder, and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Contact not found: {0}")]
    ContactNotFound(String),
    #[error("Date and time {0} is not in the future")]
    PastDateTime(DateTime<Utc>),
    #[error("Could not understand date or time: {0}")]
    UnparsableDateTime(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Validation failures are answered with a re-prompt instead of ending the flow.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount(_)
                | LedgerError::PastDateTime(_)
                | LedgerError::UnparsableDateTime(_)
                | LedgerError::InvalidInput(_)
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
