//! Core traits for storage and snapshot abstraction
//!
//! Upper layers (concurrency, engine, primitives) only see these traits, so
//! the BTreeMap-backed store can be replaced without touching them.

use std::time::Duration;

use crate::error::Result;
use crate::timestamp::Timestamp;
use crate::types::Key;
use crate::versioned::VersionedValue;

/// Ordered key-value storage with per-entry expiry
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads. Point operations on one key are linearizable.
pub trait Storage: Send + Sync {
    /// Get current value for key
    ///
    /// Returns None if the key doesn't exist or has expired.
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>>;

    /// Put a value, allocating a fresh version
    ///
    /// With `ttl`, the entry becomes invisible once `now >= now_at_put + ttl`.
    fn put(&self, key: Key, value: Vec<u8>, ttl: Option<Duration>) -> Result<u64>;

    /// Delete a key, returning the previous value if it was live
    fn delete(&self, key: &Key) -> Result<Option<VersionedValue>>;

    /// Scan live keys starting with `prefix`, in key order
    fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>>;

    /// Current global version
    fn current_version(&self) -> u64;

    /// Put a value with a version chosen by the caller
    ///
    /// Used by transaction commit (all writes of one commit share its version)
    /// and by log replay. `expires_at` is absolute so replay preserves it.
    fn put_with_version(
        &self,
        key: Key,
        value: Vec<u8>,
        version: u64,
        expires_at: Option<Timestamp>,
    ) -> Result<()>;

    /// Delete a key as part of the commit at `version`
    fn delete_with_version(&self, key: &Key, version: u64) -> Result<Option<VersionedValue>>;
}

/// Read-only point-in-time view used by transactions
pub trait SnapshotView: Send + Sync {
    /// Get value from snapshot
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>>;

    /// Scan keys with prefix from snapshot, in key order
    fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>>;

    /// Version the snapshot was taken at
    fn version(&self) -> u64;
}
