//! Versioned value returned by storage reads

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// A stored value together with the commit version that wrote it
///
/// Versions are allocated from one global counter, so two reads of the same
/// key returning the same version observed the same write. Transaction
/// validation relies on this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// Raw value bytes
    pub value: Vec<u8>,
    /// Commit version of the write
    pub version: u64,
    /// Wall-clock time of the write
    pub timestamp: Timestamp,
}

impl VersionedValue {
    /// Create a versioned value stamped with the current time
    pub fn new(value: Vec<u8>, version: u64) -> Self {
        VersionedValue {
            value,
            version,
            timestamp: Timestamp::now(),
        }
    }

    /// Consume and return the value bytes
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}
