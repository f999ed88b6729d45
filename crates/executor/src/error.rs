//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Coarse at the bottom**: storage, corruption and crypto failures all
//!   become [`Error::Internal`]

use serde::{Deserialize, Serialize};

/// Command execution errors.
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Not Found | `NotFound` | Account or data key doesn't exist |
/// | State | `AlreadyExists` | Account name taken |
/// | Authentication | `InvalidCredentials`, `InvalidToken`, `Expired`, `Revoked` | Login and logout outcomes |
/// | Authorization | `Unauthorized`, `Forbidden` | Requester may not run the command |
/// | Constraint | `QuotaExceeded`, `PayloadTooLarge` | Data limits |
/// | Validation | `InvalidInput` | Bad name, key, password or JSON body |
/// | System | `Internal` | Infrastructure errors |
///
/// # Example
///
/// ```ignore
/// use genesis_executor::{Command, Error};
///
/// match executor.execute(cmd) {
///     Ok(output) => { /* handle success */ }
///     Err(Error::QuotaExceeded { limit, .. }) => {
///         println!("at most {} keys", limit);
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Not Found ====================
    /// Account or data key not found
    #[error("not found: {what}")]
    NotFound { what: String },

    // ==================== State ====================
    /// Account name already taken
    #[error("already exists: {what}")]
    AlreadyExists { what: String },

    // ==================== Authentication ====================
    /// Unknown account or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token is malformed or its signature does not verify
    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    /// Token is past its expiry
    #[error("token expired")]
    Expired,

    /// Token was revoked by a logout
    #[error("token revoked")]
    Revoked,

    // ==================== Authorization ====================
    /// Token missing, invalid, or its account is gone
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    // ==================== Constraint ====================
    /// Owner already holds the maximum number of keys
    #[error("too many keys: {count} in use, limit is {limit}")]
    QuotaExceeded { count: usize, limit: usize },

    /// Body exceeds the configured maximum size
    #[error("payload too large: {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    // ==================== Validation ====================
    /// Malformed argument
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    // ==================== System ====================
    /// Storage, crypto or invariant failure
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Short machine-readable kind, stable across releases
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::AlreadyExists { .. } => "already_exists",
            Error::InvalidCredentials => "invalid_credentials",
            Error::InvalidToken { .. } => "invalid_token",
            Error::Expired => "expired",
            Error::Revoked => "revoked",
            Error::Unauthorized => "unauthorized",
            Error::Forbidden { .. } => "forbidden",
            Error::QuotaExceeded { .. } => "quota_exceeded",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::InvalidInput { .. } => "invalid_input",
            Error::Internal { .. } => "internal",
        }
    }

    /// True for failures the caller cannot fix by changing the request
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal { .. })
    }
}
