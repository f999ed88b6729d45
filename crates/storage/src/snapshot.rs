//! StoreSnapshot: copy-on-read view over the live store
//!
//! Taking a snapshot is an `Arc` clone plus a version load; nothing is
//! copied up front. The first read of a key (or prefix) goes to the live
//! store and is cached, so repeated reads inside one transaction return the
//! same answer. Commit-time validation rejects a transaction if anything it
//! read has changed since, which is what makes the view consistent.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use genesis_core::{Key, Result, SnapshotView, Storage, VersionedValue};

use crate::unified::UnifiedStore;

/// Lazily populated view of a `UnifiedStore`
#[derive(Debug)]
pub struct StoreSnapshot {
    version: u64,
    store: Arc<UnifiedStore>,
    reads: RwLock<HashMap<Key, Option<VersionedValue>>>,
    scans: RwLock<HashMap<Key, Vec<(Key, VersionedValue)>>>,
}

impl StoreSnapshot {
    pub(crate) fn new(version: u64, store: Arc<UnifiedStore>) -> Self {
        Self {
            version,
            store,
            reads: RwLock::new(HashMap::new()),
            scans: RwLock::new(HashMap::new()),
        }
    }

    /// Number of keys pinned by reads so far
    pub fn cached_keys(&self) -> usize {
        self.reads.read().len()
    }
}

impl SnapshotView for StoreSnapshot {
    fn get(&self, key: &Key) -> Result<Option<VersionedValue>> {
        if let Some(cached) = self.reads.read().get(key) {
            return Ok(cached.clone());
        }

        let live = self.store.get(key)?;
        let mut reads = self.reads.write();
        Ok(reads.entry(key.clone()).or_insert(live).clone())
    }

    fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>> {
        if let Some(cached) = self.scans.read().get(prefix) {
            return Ok(cached.clone());
        }

        let live = self.store.scan_prefix(prefix)?;
        {
            let mut reads = self.reads.write();
            for (k, vv) in &live {
                reads.entry(k.clone()).or_insert_with(|| Some(vv.clone()));
            }
        }
        let mut scans = self.scans.write();
        Ok(scans.entry(prefix.clone()).or_insert(live).clone())
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_read_is_pinned() {
        let store = Arc::new(UnifiedStore::new());
        let k1 = Key::new_data("alice", "a");
        let k2 = Key::new_data("alice", "b");
        store.put(k1.clone(), b"1".to_vec(), None).unwrap();

        let snapshot = store.create_snapshot();
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.get(&k1).unwrap().unwrap().value, b"1".to_vec());
        assert_eq!(snapshot.scan_prefix(&Key::new_data_prefix("alice")).unwrap().len(), 1);

        store.put(k2.clone(), b"2".to_vec(), None).unwrap();
        store.delete(&k1).unwrap();

        assert_eq!(snapshot.get(&k1).unwrap().unwrap().value, b"1".to_vec());
        assert_eq!(snapshot.scan_prefix(&Key::new_data_prefix("alice")).unwrap().len(), 1);
    }

    #[test]
    fn test_taking_snapshot_copies_nothing() {
        let store = Arc::new(UnifiedStore::new());
        for i in 0..100 {
            store
                .put(Key::new_data("alice", &i.to_string()), vec![0; 1024], None)
                .unwrap();
        }

        let snapshot = store.create_snapshot();
        assert_eq!(snapshot.cached_keys(), 0);
        snapshot.get(&Key::new_data("bob", "x")).unwrap();
        assert_eq!(snapshot.cached_keys(), 1);
    }

    #[test]
    fn test_scan_pins_its_keys() {
        let store = Arc::new(UnifiedStore::new());
        let key = Key::new_data("o", "a");
        store.put(key.clone(), b"old".to_vec(), None).unwrap();

        let snapshot = store.create_snapshot();
        snapshot.scan_prefix(&Key::new_data_prefix("o")).unwrap();
        store.put(key.clone(), b"new".to_vec(), None).unwrap();

        assert_eq!(snapshot.get(&key).unwrap().unwrap().value, b"old".to_vec());
    }

    #[test]
    fn test_snapshot_hides_expired() {
        let store = Arc::new(UnifiedStore::new());
        let key = Key::new_revoked("t");
        store.put(key.clone(), vec![], Some(Duration::ZERO)).unwrap();

        let snapshot = store.create_snapshot();
        assert!(snapshot.get(&key).unwrap().is_none());
    }
}
