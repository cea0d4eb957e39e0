//! Error types for the reader

use ebp_ledger::{IdentifierError, LedgerError};
use thiserror::Error;

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Reader error types
///
/// Records that simply are not protocol data never surface here; they are
/// filtered out. An `Ok` with no documents means "nothing found".
#[derive(Error, Debug)]
pub enum ReaderError {
    /// No asset id was given
    #[error("Asset id is empty")]
    EmptyAssetId,

    /// Asset id could not be parsed
    #[error("Invalid asset id: {0}")]
    InvalidAssetId(IdentifierError),

    /// Ledger has no such asset
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Transport failure talking to the ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A single ledger call exceeded its timeout
    #[error("Ledger call timed out: {operation}")]
    CallTimeout { operation: &'static str },

    /// The whole read exceeded its deadline
    #[error("Reconstruction deadline exceeded")]
    DeadlineExceeded,

    /// The caller cancelled the read
    #[error("Reconstruction cancelled")]
    Cancelled,

    /// A chain-walk worker failed
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<IdentifierError> for ReaderError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::Empty => ReaderError::EmptyAssetId,
            other => ReaderError::InvalidAssetId(other),
        }
    }
}

impl From<tokio::task::JoinError> for ReaderError {
    fn from(err: tokio::task::JoinError) -> Self {
        ReaderError::Worker(err.to_string())
    }
}

impl ReaderError {
    /// True for failures caused by the ledger transport rather than the input
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ReaderError::Ledger(_) | ReaderError::CallTimeout { .. }
        )
    }
}
