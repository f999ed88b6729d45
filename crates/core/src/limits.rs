//! Data store limits
//!
//! Limits are chosen at database open time (see the engine's config file)
//! and passed explicitly to the components that enforce them.

use crate::error::{GenesisError, Result};

/// Default number of distinct keys one owner may hold
pub const DEFAULT_KEYS_PER_USER: usize = 100;

/// Default maximum size of one stored document (1 MiB)
pub const DEFAULT_MAX_DATA_BYTES: usize = 1024 * 1024;

/// Per-owner data limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum distinct data keys per owner
    pub keys_per_user: usize,

    /// Maximum size of one stored value in bytes
    pub max_data_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            keys_per_user: DEFAULT_KEYS_PER_USER,
            max_data_bytes: DEFAULT_MAX_DATA_BYTES,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            keys_per_user: 3,
            max_data_bytes: 64,
        }
    }

    /// Reject values larger than `max_data_bytes`
    pub fn validate_data_size(&self, size: usize) -> Result<()> {
        if size > self.max_data_bytes {
            return Err(GenesisError::PayloadTooLarge {
                size,
                limit: self.max_data_bytes,
            });
        }
        Ok(())
    }

    /// Reject adding a new key when `count` keys are already held
    pub fn validate_new_key(&self, count: usize) -> Result<()> {
        if count >= self.keys_per_user {
            return Err(GenesisError::QuotaExceeded {
                count,
                limit: self.keys_per_user,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = Limits::default();
        assert_eq!(limits.keys_per_user, 100);
        assert_eq!(limits.max_data_bytes, 1024 * 1024);
    }

    #[test]
    fn test_data_size_boundary() {
        let limits = Limits::with_small_limits();
        assert!(limits.validate_data_size(64).is_ok());
        assert!(matches!(
            limits.validate_data_size(65),
            Err(GenesisError::PayloadTooLarge { size: 65, limit: 64 })
        ));
    }

    #[test]
    fn test_new_key_boundary() {
        let limits = Limits::with_small_limits();
        assert!(limits.validate_new_key(2).is_ok());
        assert!(matches!(
            limits.validate_new_key(3),
            Err(GenesisError::QuotaExceeded { count: 3, limit: 3 })
        ));
    }
}
