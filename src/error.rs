// Student ACID Lab - Error Types
// Typed failures for the record store and the transaction walkthrough

use thiserror::Error;

/// Failures of a Record Store operation.
///
/// Validation and lookup failures are user-facing warnings; they never
/// mutate the collection.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("All fields are required! Missing: {field}")]
    Validation { field: &'static str },

    #[error("No student found matching '{0}'")]
    NotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a Transaction Walkthrough operation.
#[derive(Error, Debug)]
pub enum WalkthroughError {
    #[error("cannot start a transaction within a transaction")]
    AlreadyOpen,

    #[error("no transaction is active")]
    NoOpenTransaction,

    #[error("database connection is closed")]
    Disconnected,

    #[error("account '{0}' does not exist")]
    UnknownAccount(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl RecordError {
    pub fn is_validation(&self) -> bool {
        matches!(self, RecordError::Validation { .. })
    }
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
pub type WalkthroughResult<T> = std::result::Result<T, WalkthroughError>;
