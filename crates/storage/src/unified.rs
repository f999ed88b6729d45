//! UnifiedStore: storage backend with BTreeMap and version management
//!
//! - `BTreeMap<Key, StoredValue>` for ordered key storage with expiry
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for monotonically increasing version numbers
//! - `TTLIndex` so the cleaner finds expired keys without a full scan
//!
//! Each key stores only its latest value. Expiry is logical: expired
//! values are filtered at read time and physically removed later by the
//! `TTLCleaner`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use genesis_core::{Key, Result, Storage, Timestamp, VersionedValue};

use crate::snapshot::StoreSnapshot;
use crate::stored_value::StoredValue;
use crate::ttl::TTLIndex;

/// Unified storage backend using BTreeMap with RwLock
///
/// Data and TTL index are always updated together under both write locks,
/// taken in the same order (data, then ttl_index) everywhere.
#[derive(Debug)]
pub struct UnifiedStore {
    data: Arc<RwLock<BTreeMap<Key, StoredValue>>>,
    ttl_index: Arc<RwLock<TTLIndex>>,
    version: AtomicU64,
}

impl UnifiedStore {
    /// Create a new empty UnifiedStore
    ///
    /// Initial version is 0 (no writes have occurred).
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            ttl_index: Arc::new(RwLock::new(TTLIndex::new())),
            version: AtomicU64::new(0),
        }
    }

    /// Keys whose deadline has passed at `now`
    pub fn find_expired_keys(&self, now: Timestamp) -> Vec<Key> {
        self.ttl_index.read().find_expired(now)
    }

    /// Physically remove `key` if it is expired at `now`
    ///
    /// Re-checks under the write lock, so a key that was rewritten with a
    /// later deadline after `find_expired_keys` ran is left alone.
    pub fn remove_if_expired(&self, key: &Key, now: Timestamp) -> bool {
        let mut data = self.data.write();
        let mut ttl_idx = self.ttl_index.write();

        let expired = matches!(data.get(key), Some(sv) if sv.is_expired_at(now));
        if !expired {
            return false;
        }
        if let Some(sv) = data.remove(key) {
            if let Some(expiry) = sv.expiry_timestamp() {
                ttl_idx.remove(expiry, key);
            }
        }
        true
    }

    /// Every entry still live at `now`, in key order
    ///
    /// Returns `(key, value, expires_at)` triples, the shape log
    /// compaction writes.
    pub fn live_entries(&self, now: Timestamp) -> Vec<(Key, Vec<u8>, Option<Timestamp>)> {
        self.data
            .read()
            .iter()
            .filter(|(_, sv)| !sv.is_expired_at(now))
            .map(|(k, sv)| (k.clone(), sv.versioned().value.clone(), sv.expiry_timestamp()))
            .collect()
    }

    /// Number of physically stored entries, including expired ones
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Create a snapshot for a transaction
    ///
    /// O(1): the snapshot shares this store and copies values only as they
    /// are read.
    pub fn create_snapshot(self: &Arc<Self>) -> StoreSnapshot {
        StoreSnapshot::new(self.current_version(), Arc::clone(self))
    }

    /// Apply a batch of writes and deletes atomically
    ///
    /// Holds the write locks for the whole batch so no reader observes a
    /// partially applied transaction.
    pub fn apply_batch(
        &self,
        writes: &[(Key, Vec<u8>, Option<Timestamp>)],
        deletes: &[Key],
        version: u64,
    ) -> Result<()> {
        let mut data = self.data.write();
        let mut ttl_idx = self.ttl_index.write();

        for (key, value, expires_at) in writes {
            let stored = StoredValue::with_expiry(value.clone(), version, *expires_at);
            insert_locked(&mut data, &mut ttl_idx, key.clone(), stored);
        }

        for key in deletes {
            remove_locked(&mut data, &mut ttl_idx, key);
        }

        self.version.fetch_max(version, Ordering::SeqCst);
        Ok(())
    }
}

fn insert_locked(
    data: &mut BTreeMap<Key, StoredValue>,
    ttl_idx: &mut TTLIndex,
    key: Key,
    stored: StoredValue,
) {
    if let Some(old) = data.get(&key) {
        if let Some(old_expiry) = old.expiry_timestamp() {
            ttl_idx.remove(old_expiry, &key);
        }
    }
    if let Some(expiry) = stored.expiry_timestamp() {
        ttl_idx.insert(expiry, key.clone());
    }
    data.insert(key, stored);
}

fn remove_locked(
    data: &mut BTreeMap<Key, StoredValue>,
    ttl_idx: &mut TTLIndex,
    key: &Key,
) -> Option<StoredValue> {
    let removed = data.remove(key);
    if let Some(ref sv) = removed {
        if let Some(expiry) = sv.expiry_timestamp() {
            ttl_idx.remove(expiry, key);
        }
    }
    removed
}

impl Default for UnifiedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for UnifiedStore {
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>> {
        let data = self.data.read();
        match data.get(key) {
            Some(sv) if !sv.is_expired() => Ok(Some(sv.versioned().clone())),
            _ => Ok(None),
        }
    }

    fn put(&self, key: Key, value: Vec<u8>, ttl: Option<Duration>) -> Result<u64> {
        // Allocate version BEFORE acquiring write lock
        let version = self.next_version();
        let stored = StoredValue::new(value, version, ttl);

        let mut data = self.data.write();
        let mut ttl_idx = self.ttl_index.write();
        insert_locked(&mut data, &mut ttl_idx, key, stored);

        Ok(version)
    }

    fn delete(&self, key: &Key) -> Result<Option<VersionedValue>> {
        let mut data = self.data.write();
        let mut ttl_idx = self.ttl_index.write();

        let removed = remove_locked(&mut data, &mut ttl_idx, key);
        Ok(removed
            .filter(|sv| !sv.is_expired())
            .map(StoredValue::into_versioned))
    }

    fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>> {
        let data = self.data.read();

        let results = data
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(_, sv)| !sv.is_expired())
            .map(|(k, sv)| (k.clone(), sv.versioned().clone()))
            .collect();

        Ok(results)
    }

    fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn put_with_version(
        &self,
        key: Key,
        value: Vec<u8>,
        version: u64,
        expires_at: Option<Timestamp>,
    ) -> Result<()> {
        let stored = StoredValue::with_expiry(value, version, expires_at);

        let mut data = self.data.write();
        let mut ttl_idx = self.ttl_index.write();
        insert_locked(&mut data, &mut ttl_idx, key, stored);

        self.version.fetch_max(version, Ordering::SeqCst);
        Ok(())
    }

    fn delete_with_version(&self, key: &Key, version: u64) -> Result<Option<VersionedValue>> {
        let mut data = self.data.write();
        let mut ttl_idx = self.ttl_index.write();

        let removed = remove_locked(&mut data, &mut ttl_idx, key);
        self.version.fetch_max(version, Ordering::SeqCst);
        Ok(removed.map(StoredValue::into_versioned))
    }
}
