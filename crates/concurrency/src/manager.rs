//! Transaction manager for coordinating commit operations
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. take the commit lock
//! 2. validate (first committer wins)
//! 3. allocate commit_version
//! 4. append one WalRecord (durability point)
//! 5. apply_batch to storage (visibility point)
//! ```
//!
//! The commit lock makes validate-then-apply atomic with respect to other
//! commits. Readers never take it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use genesis_durability::{AppendError, WalRecord, WalWrite, WalWriter};
use genesis_storage::UnifiedStore;
use parking_lot::Mutex;
use tracing::error;

use crate::transaction::{CommitError, TransactionContext, TransactionStatus};

/// Manages transaction ids, commit versions and atomic commits
pub struct TransactionManager {
    version: AtomicU64,
    next_txn_id: AtomicU64,
    commit_lock: Mutex<()>,
}

impl TransactionManager {
    /// Create a new transaction manager
    ///
    /// `initial_version` is the store's version after recovery.
    pub fn new(initial_version: u64) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(1),
            commit_lock: Mutex::new(()),
        }
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate next commit version
    pub fn allocate_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Begin a transaction over a fresh snapshot of `store`
    pub fn begin(&self, store: &Arc<UnifiedStore>) -> TransactionContext {
        TransactionContext::with_snapshot(self.next_txn_id(), Box::new(store.create_snapshot()))
    }

    /// Commit a transaction atomically
    ///
    /// Returns the commit version. Read-only transactions are validated but
    /// return the current version without touching the log.
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        store: &UnifiedStore,
        wal: Option<&Mutex<WalWriter>>,
    ) -> std::result::Result<u64, CommitError> {
        let _guard = self.commit_lock.lock();

        txn.commit(store)?;

        if txn.is_read_only() {
            return Ok(self.current_version());
        }

        let commit_version = self.allocate_version();
        let writes = txn.writes();
        let deletes = txn.deletes();

        if let Some(wal) = wal {
            let record = WalRecord::new(
                commit_version,
                writes
                    .iter()
                    .map(|(key, value, expires_at)| WalWrite {
                        key: key.clone(),
                        value: value.clone(),
                        expires_at: *expires_at,
                    })
                    .collect(),
                deletes.clone(),
            );
            match wal.lock().append(&record) {
                Ok(()) => {}
                Err(AppendError::Unsynced(reason)) => {
                    // Replay will restore this record, so memory must match it.
                    store
                        .apply_batch(&writes, &deletes, commit_version)
                        .map_err(|e| CommitError::Storage(e.to_string()))?;
                    error!(
                        txn_id = txn.txn_id,
                        commit_version,
                        reason = %reason,
                        "commit applied but not synced; log refuses further commits"
                    );
                    return Err(CommitError::Unsynced(reason));
                }
                Err(e) => {
                    txn.status = TransactionStatus::Aborted {
                        reason: format!("wal append failed: {}", e),
                    };
                    return Err(CommitError::WALError(e.to_string()));
                }
            }
        }

        if let Err(e) = store.apply_batch(&writes, &deletes, commit_version) {
            // The log already holds the record; replay restores it.
            error!(
                txn_id = txn.txn_id,
                commit_version,
                error = %e,
                "storage apply failed after wal append"
            );
            return Err(CommitError::Storage(e.to_string()));
        }

        Ok(commit_version)
    }

    /// Run `f` while no commit can start or finish
    pub fn with_commits_paused<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.commit_lock.lock();
        f()
    }

    /// Explicitly abort a transaction
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) -> genesis_core::Result<()> {
        txn.mark_aborted(reason)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}
