//! Error types for the genesis backend
//!
//! Every layer below the executor reports failures through [`GenesisError`].
//! The executor maps these onto its own serializable error type, collapsing
//! storage-level failures into `Internal`.

use std::io;
use thiserror::Error;

/// Result type alias for genesis operations
pub type Result<T> = std::result::Result<T, GenesisError>;

/// Error taxonomy shared by storage, engine, security and primitives
#[derive(Debug, Error)]
pub enum GenesisError {
    /// Entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Entity already exists (account names are unique)
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Unknown account or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token could not be decoded or its signature did not verify
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token is past its expiry
    #[error("token expired")]
    Expired,

    /// Token id is in the revocation set
    #[error("token revoked")]
    Revoked,

    /// Owner already holds the maximum number of data keys
    #[error("quota exceeded: {count} of {limit} keys in use")]
    QuotaExceeded {
        /// Keys currently owned
        count: usize,
        /// Configured per-owner limit
        limit: usize,
    },

    /// Value is larger than the configured maximum
    #[error("payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge {
        /// Size of the rejected value
        size: usize,
        /// Maximum permitted size
        limit: usize,
    },

    /// Value is not syntactically valid JSON
    #[error("invalid json: {0}")]
    InvalidJson(String),

    /// Malformed argument or configuration
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transaction validation failed against concurrent commits
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Stored or logged bytes could not be decoded
    #[error("data corruption: {0}")]
    Corruption(String),

    /// I/O or storage engine failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Hashing or signing failure
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

impl GenesisError {
    /// Create a NotFound error
    pub fn not_found(what: impl Into<String>) -> Self {
        GenesisError::NotFound(what.into())
    }

    /// Create an AlreadyExists error
    pub fn already_exists(what: impl Into<String>) -> Self {
        GenesisError::AlreadyExists(what.into())
    }

    /// Create an InvalidToken error
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        GenesisError::InvalidToken(reason.into())
    }

    /// Create an InvalidInput error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        GenesisError::InvalidInput(reason.into())
    }

    /// Create a Conflict error
    pub fn conflict(reason: impl Into<String>) -> Self {
        GenesisError::Conflict(reason.into())
    }

    /// Create a Corruption error
    pub fn corruption(reason: impl Into<String>) -> Self {
        GenesisError::Corruption(reason.into())
    }

    /// Create a Storage error
    pub fn storage(reason: impl Into<String>) -> Self {
        GenesisError::Storage(reason.into())
    }

    /// Create a Crypto error
    pub fn crypto(reason: impl Into<String>) -> Self {
        GenesisError::Crypto(reason.into())
    }

    /// Create an Internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        GenesisError::Internal(reason.into())
    }

    /// True for transaction conflicts, the only kind retried internally
    pub fn is_conflict(&self) -> bool {
        matches!(self, GenesisError::Conflict(_))
    }

    /// True for NotFound
    pub fn is_not_found(&self) -> bool {
        matches!(self, GenesisError::NotFound(_))
    }
}

impl From<io::Error> for GenesisError {
    fn from(e: io::Error) -> Self {
        GenesisError::Storage(e.to_string())
    }
}
