//! Transaction context for OCC
//!
//! TransactionContext tracks all reads, scans, writes and deletes of one
//! transaction so they can be validated at commit time.
//!
//! # Lifecycle
//!
//! 1. **BEGIN**: create with `with_snapshot()`, status is `Active`
//! 2. **READ/WRITE**: `get()`, `scan_prefix()`, `put()`, `delete()`
//! 3. **VALIDATE**: `commit()` moves through `Validating`
//! 4. **COMMIT/ABORT**: ends in `Committed` or `Aborted`

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use genesis_core::{GenesisError, Key, Result, SnapshotView, Storage, Timestamp};
use thiserror::Error;

use crate::validation::{validate_transaction, ValidationResult};

/// Error type for commit failures
#[derive(Debug, Clone, Error)]
pub enum CommitError {
    /// Transaction aborted due to validation conflicts
    #[error("commit failed: {} conflict(s)", .0.conflict_count())]
    ValidationFailed(ValidationResult),

    /// Transaction was not in correct state for commit
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// WAL append failed; nothing was applied
    #[error("wal error: {0}")]
    WALError(String),

    /// The record was logged and applied but could not be synced
    #[error("commit not synced: {0}")]
    Unsynced(String),

    /// Storage failed during validation or apply
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<CommitError> for GenesisError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(result) => GenesisError::conflict(format!(
                "validation failed: {} conflict(s)",
                result.conflict_count()
            )),
            CommitError::InvalidState(msg) => GenesisError::internal(msg),
            CommitError::WALError(msg) => GenesisError::storage(format!("wal: {}", msg)),
            CommitError::Unsynced(msg) => GenesisError::storage(format!("wal sync: {}", msg)),
            CommitError::Storage(msg) => GenesisError::storage(msg),
        }
    }
}

/// Transaction status
///
/// `Active` → `Validating` → `Committed` | `Aborted`, or `Active` → `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction is being validated for conflicts
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// Summary of buffered operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingOperations {
    /// Buffered puts
    pub puts: usize,
    /// Buffered deletes
    pub deletes: usize,
}

impl PendingOperations {
    /// Total buffered operations
    pub fn total(&self) -> usize {
        self.puts + self.deletes
    }

    /// True if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A buffered write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    /// Value bytes
    pub value: Vec<u8>,
    /// Absolute expiry, if any
    pub expires_at: Option<Timestamp>,
}

/// A prefix scan observed from the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    /// The scanned prefix
    pub prefix: Key,
    /// Keys and versions the snapshot returned, in key order
    pub entries: Vec<(Key, u64)>,
}

/// Per-transaction read/write tracking
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,

    /// Version at transaction start (snapshot version)
    pub start_version: u64,

    snapshot: Option<Box<dyn SnapshotView>>,

    /// Keys read and their versions; 0 means the key was absent
    pub read_set: HashMap<Key, u64>,

    /// Prefix scans and what they returned
    pub scan_set: Vec<ScanRecord>,

    /// Keys written with their new values (buffered)
    pub write_set: BTreeMap<Key, PendingWrite>,

    /// Keys to delete (buffered)
    pub delete_set: BTreeSet<Key>,

    /// Current transaction status
    pub status: TransactionStatus,

    start_time: Instant,
}

impl TransactionContext {
    /// Create a transaction without a snapshot (writes only)
    pub fn new(txn_id: u64, start_version: u64) -> Self {
        TransactionContext {
            txn_id,
            start_version,
            snapshot: None,
            read_set: HashMap::new(),
            scan_set: Vec::new(),
            write_set: BTreeMap::new(),
            delete_set: BTreeSet::new(),
            status: TransactionStatus::Active,
            start_time: Instant::now(),
        }
    }

    /// Create a transaction reading through `snapshot`
    pub fn with_snapshot(txn_id: u64, snapshot: Box<dyn SnapshotView>) -> Self {
        let mut txn = Self::new(txn_id, snapshot.version());
        txn.snapshot = Some(snapshot);
        txn
    }

    // === Read Operations ===

    /// Get a value, seeing this transaction's own writes and deletes first
    ///
    /// Only reads that reach the snapshot are tracked in the read-set.
    pub fn get(&mut self, key: &Key) -> Result<Option<Vec<u8>>> {
        self.ensure_active()?;

        if let Some(write) = self.write_set.get(key) {
            return Ok(Some(write.value.clone()));
        }
        if self.delete_set.contains(key) {
            return Ok(None);
        }

        let versioned = self.snapshot()?.get(key)?;
        match versioned {
            Some(vv) => {
                self.read_set.insert(key.clone(), vv.version);
                Ok(Some(vv.value))
            }
            None => {
                self.read_set.insert(key.clone(), 0);
                Ok(None)
            }
        }
    }

    /// Check if a key exists in the transaction's view
    pub fn exists(&mut self, key: &Key) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Scan keys with a prefix, merged with this transaction's own writes
    ///
    /// The snapshot result is recorded in the scan-set; results are in key
    /// order.
    pub fn scan_prefix(&mut self, prefix: &Key) -> Result<Vec<(Key, Vec<u8>)>> {
        self.ensure_active()?;

        let snapshot_results = self.snapshot()?.scan_prefix(prefix)?;
        self.scan_set.push(ScanRecord {
            prefix: prefix.clone(),
            entries: snapshot_results
                .iter()
                .map(|(k, vv)| (k.clone(), vv.version))
                .collect(),
        });

        let mut results: BTreeMap<Key, Vec<u8>> = snapshot_results
            .into_iter()
            .filter(|(k, _)| !self.delete_set.contains(k))
            .map(|(k, vv)| (k, vv.value))
            .collect();

        for (key, write) in self.write_set.range(prefix.clone()..) {
            if !key.starts_with(prefix) {
                break;
            }
            results.insert(key.clone(), write.value.clone());
        }

        Ok(results.into_iter().collect())
    }

    fn snapshot(&self) -> Result<&dyn SnapshotView> {
        self.snapshot
            .as_deref()
            .ok_or_else(|| GenesisError::internal("transaction has no snapshot for reads"))
    }

    // === Write Operations ===

    /// Buffer a write
    pub fn put(&mut self, key: Key, value: Vec<u8>) -> Result<()> {
        self.put_expiring(key, value, None)
    }

    /// Buffer a write that becomes invisible at `expires_at`
    pub fn put_expiring(
        &mut self,
        key: Key,
        value: Vec<u8>,
        expires_at: Option<Timestamp>,
    ) -> Result<()> {
        self.ensure_active()?;
        self.delete_set.remove(&key);
        self.write_set.insert(key, PendingWrite { value, expires_at });
        Ok(())
    }

    /// Buffer a delete
    pub fn delete(&mut self, key: Key) -> Result<()> {
        self.ensure_active()?;
        self.write_set.remove(&key);
        self.delete_set.insert(key);
        Ok(())
    }

    // === State ===

    /// Check if transaction is active
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Check if transaction committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Check if transaction aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Error unless the transaction is still active
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(GenesisError::internal(format!(
                "transaction {} is not active: {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// `Active` → `Aborted`, discarding buffered operations
    ///
    /// The read-set is kept for diagnostics.
    pub fn mark_aborted(&mut self, reason: String) -> Result<()> {
        match &self.status {
            TransactionStatus::Committed => Err(GenesisError::internal(format!(
                "cannot abort committed transaction {}",
                self.txn_id
            ))),
            TransactionStatus::Aborted { .. } => Err(GenesisError::internal(format!(
                "transaction {} already aborted",
                self.txn_id
            ))),
            _ => {
                self.status = TransactionStatus::Aborted { reason };
                self.write_set.clear();
                self.delete_set.clear();
                Ok(())
            }
        }
    }

    /// Reason given when the transaction aborted
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.status {
            TransactionStatus::Aborted { reason } => Some(reason),
            _ => None,
        }
    }

    /// Counts of buffered operations
    pub fn pending_operations(&self) -> PendingOperations {
        PendingOperations {
            puts: self.write_set.len(),
            deletes: self.delete_set.len(),
        }
    }

    /// True if nothing would be published on commit
    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty() && self.delete_set.is_empty()
    }

    // === Commit Operation ===

    /// Validate against `store` and move to `Committed` or `Aborted`
    ///
    /// Does not publish anything; see `TransactionManager::commit`.
    pub fn commit<S: Storage>(&mut self, store: &S) -> std::result::Result<(), CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "cannot commit transaction {} from {:?} state",
                self.txn_id, self.status
            )));
        }
        self.status = TransactionStatus::Validating;

        let validation = match validate_transaction(self, store) {
            Ok(v) => v,
            Err(e) => {
                self.status = TransactionStatus::Aborted {
                    reason: format!("validation error: {}", e),
                };
                return Err(CommitError::Storage(e.to_string()));
            }
        };

        if !validation.is_valid() {
            self.status = TransactionStatus::Aborted {
                reason: format!(
                    "commit failed: {} conflict(s) detected",
                    validation.conflict_count()
                ),
            };
            return Err(CommitError::ValidationFailed(validation));
        }

        self.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Buffered writes as `(key, value, expires_at)` triples
    pub fn writes(&self) -> Vec<(Key, Vec<u8>, Option<Timestamp>)> {
        self.write_set
            .iter()
            .map(|(k, w)| (k.clone(), w.value.clone(), w.expires_at))
            .collect()
    }

    /// Buffered deletes
    pub fn deletes(&self) -> Vec<Key> {
        self.delete_set.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_storage::UnifiedStore;
    use std::sync::Arc;

    fn store_with(keys: &[(&str, &str)]) -> Arc<UnifiedStore> {
        let store = Arc::new(UnifiedStore::new());
        for (owner, key) in keys {
            store
                .put(Key::new_data(owner, key), key.as_bytes().to_vec(), None)
                .unwrap();
        }
        store
    }

    #[test]
    fn test_read_your_writes_and_deletes() {
        let store = store_with(&[("o", "a")]);
        let mut txn = TransactionContext::with_snapshot(1, Box::new(store.create_snapshot()));

        let a = Key::new_data("o", "a");
        let b = Key::new_data("o", "b");
        txn.put(b.clone(), b"new".to_vec()).unwrap();
        txn.delete(a.clone()).unwrap();

        assert_eq!(txn.get(&b).unwrap(), Some(b"new".to_vec()));
        assert_eq!(txn.get(&a).unwrap(), None);
        assert!(txn.read_set.is_empty());
    }

    #[test]
    fn test_absent_read_tracked_as_zero() {
        let store = Arc::new(UnifiedStore::new());
        let mut txn = TransactionContext::with_snapshot(1, Box::new(store.create_snapshot()));
        let key = Key::new_account("ghost");
        assert!(!txn.exists(&key).unwrap());
        assert_eq!(txn.read_set.get(&key), Some(&0));
    }

    #[test]
    fn test_scan_merges_own_writes_in_order() {
        let store = store_with(&[("o", "a"), ("o", "c"), ("p", "b")]);
        let mut txn = TransactionContext::with_snapshot(1, Box::new(store.create_snapshot()));

        txn.put(Key::new_data("o", "b"), b"b".to_vec()).unwrap();
        txn.delete(Key::new_data("o", "c")).unwrap();

        let keys: Vec<String> = txn
            .scan_prefix(&Key::new_data_prefix("o"))
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.decode_data().unwrap().1)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(txn.scan_set.len(), 1);
        assert_eq!(txn.scan_set[0].entries.len(), 2);
    }

    #[test]
    fn test_abort_discards_buffers() {
        let mut txn = TransactionContext::new(1, 0);
        txn.put(Key::new_account("a"), vec![]).unwrap();
        txn.mark_aborted("user".into()).unwrap();

        assert!(txn.is_aborted());
        assert_eq!(txn.abort_reason(), Some("user"));
        assert!(txn.pending_operations().is_empty());
        assert!(txn.put(Key::new_account("b"), vec![]).is_err());
        assert!(txn.mark_aborted("again".into()).is_err());
    }

    #[test]
    fn test_commit_requires_active() {
        let store = UnifiedStore::new();
        let mut txn = TransactionContext::new(1, 0);
        txn.put(Key::new_account("a"), vec![]).unwrap();
        txn.commit(&store).unwrap();
        assert!(txn.is_committed());
        assert!(matches!(
            txn.commit(&store),
            Err(CommitError::InvalidState(_))
        ));
    }

    #[test]
    fn test_get_without_snapshot_is_internal() {
        let mut txn = TransactionContext::new(1, 0);
        assert!(matches!(
            txn.get(&Key::new_account("a")),
            Err(GenesisError::Internal(_))
        ));
    }

    #[test]
    fn test_conflict_maps_to_conflict_kind() {
        let err: GenesisError = CommitError::ValidationFailed(ValidationResult::ok()).into();
        assert!(err.is_conflict());
    }
}
