//! Error conversion from internal error types.
//!
//! Maps [`GenesisError`] onto the executor's [`Error`]. Storage-level
//! failures and exhausted conflicts collapse into `Internal`.

use genesis_core::GenesisError;

use crate::{Error, Result};

impl From<GenesisError> for Error {
    fn from(err: GenesisError) -> Self {
        match err {
            GenesisError::NotFound(what) => Error::NotFound { what },
            GenesisError::AlreadyExists(what) => Error::AlreadyExists { what },
            GenesisError::InvalidCredentials => Error::InvalidCredentials,
            GenesisError::InvalidToken(reason) => Error::InvalidToken { reason },
            GenesisError::Expired => Error::Expired,
            GenesisError::Revoked => Error::Revoked,
            GenesisError::QuotaExceeded { count, limit } => Error::QuotaExceeded { count, limit },
            GenesisError::PayloadTooLarge { size, limit } => Error::PayloadTooLarge { size, limit },
            GenesisError::InvalidJson(reason) => Error::InvalidInput {
                reason: format!("body is not valid JSON: {}", reason),
            },
            GenesisError::InvalidInput(reason) => Error::InvalidInput { reason },
            e @ (GenesisError::Conflict(_)
            | GenesisError::Corruption(_)
            | GenesisError::Storage(_)
            | GenesisError::Crypto(_)
            | GenesisError::Internal(_)) => Error::Internal {
                reason: e.to_string(),
            },
        }
    }
}

/// Convert a core result into an executor result
pub fn convert_result<T>(result: genesis_core::Result<T>) -> Result<T> {
    result.map_err(Error::from)
}
