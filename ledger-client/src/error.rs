//! Error types for the ledger client

use thiserror::Error;

/// Failure to parse one of the ledger identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Input was empty
    #[error("identifier is empty")]
    Empty,

    /// Input had the wrong number of characters
    #[error("invalid {kind} length: expected {expected}, got {actual}")]
    Length {
        kind: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// Input contained characters outside the expected alphabet
    #[error("invalid {kind} encoding: {value}")]
    Encoding { kind: &'static str, value: String },

    /// Network name or id not recognized
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

/// Ledger client error
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gateway returned an error status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Requested resource does not exist on the ledger
    #[error("Not found: {0}")]
    NotFound(String),

    /// Gateway answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Identifier in a response or request was malformed
    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),
}

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;
