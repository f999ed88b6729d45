//! Storage-layer value wrapper with expiry
//!
//! `VersionedValue` is what callers see. Expiry is a storage concern, so
//! it lives here. Expiry is absolute: a value written with a TTL keeps the
//! same deadline when it is replayed from the log after a restart.

use std::time::Duration;

use genesis_core::{Timestamp, VersionedValue};

/// A stored value with optional expiry
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    inner: VersionedValue,
    expires_at: Option<Timestamp>,
}

impl StoredValue {
    /// Create a stored value expiring `ttl` after now
    pub fn new(value: Vec<u8>, version: u64, ttl: Option<Duration>) -> Self {
        let inner = VersionedValue::new(value, version);
        let expires_at = ttl.map(|ttl| inner.timestamp.saturating_add(ttl));
        StoredValue { inner, expires_at }
    }

    /// Create a stored value with an absolute expiry
    pub fn with_expiry(value: Vec<u8>, version: u64, expires_at: Option<Timestamp>) -> Self {
        StoredValue {
            inner: VersionedValue::new(value, version),
            expires_at,
        }
    }

    /// Get the inner VersionedValue
    #[inline]
    pub fn versioned(&self) -> &VersionedValue {
        &self.inner
    }

    /// Consume and return the inner VersionedValue
    #[inline]
    pub fn into_versioned(self) -> VersionedValue {
        self.inner
    }

    /// Get the version
    #[inline]
    pub fn version(&self) -> u64 {
        self.inner.version
    }

    /// When this value stops being visible, if ever
    #[inline]
    pub fn expiry_timestamp(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Expired at `now`: visible strictly before the deadline, never at it
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|deadline| deadline.has_passed_at(now))
    }

    /// Check if this value has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}

impl From<StoredValue> for VersionedValue {
    fn from(sv: StoredValue) -> Self {
        sv.inner
    }
}
