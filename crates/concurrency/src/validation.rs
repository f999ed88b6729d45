//! Transaction validation for OCC
//!
//! - First committer wins, judged on the READ-SET and SCAN-SET
//! - Blind writes (write without read) do not conflict
//! - Read-only transactions are validated too: reads are pinned lazily, so
//!   only validation proves they saw one consistent state
//! - A key read as absent is recorded at version 0; if anyone creates it
//!   before we commit, that is a conflict

use std::collections::HashMap;

use genesis_core::{Key, Result, Storage};

use crate::transaction::{ScanRecord, TransactionContext};

/// Types of conflicts that can occur during transaction validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// Key was read at one version but the current version differs
    ReadWriteConflict {
        /// The key that has a conflict
        key: Key,
        /// Version recorded in read_set when read
        read_version: u64,
        /// Current version in storage at validation time
        current_version: u64,
    },

    /// A prefix scan would now return a different set of keys or versions
    PhantomConflict {
        /// The scanned prefix
        prefix: Key,
        /// Number of entries the transaction saw
        read_count: usize,
        /// Number of entries present at validation time
        current_count: usize,
    },
}

/// Result of transaction validation
///
/// A transaction commits only if `is_valid()` returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Create a validation result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Number of conflicts found
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }
}

/// Validate the read-set against current storage state
pub fn validate_read_set<S: Storage>(
    read_set: &HashMap<Key, u64>,
    store: &S,
) -> Result<ValidationResult> {
    let mut result = ValidationResult::ok();

    for (key, read_version) in read_set {
        let current_version = store.get(key)?.map(|vv| vv.version).unwrap_or(0);
        if current_version != *read_version {
            result.conflicts.push(ConflictType::ReadWriteConflict {
                key: key.clone(),
                read_version: *read_version,
                current_version,
            });
        }
    }

    Ok(result)
}

/// Validate recorded prefix scans against current storage state
///
/// The scan is repeated on the live store; any inserted, removed or
/// rewritten key under the prefix is a conflict.
pub fn validate_scan_set<S: Storage>(
    scan_set: &[ScanRecord],
    store: &S,
) -> Result<ValidationResult> {
    let mut result = ValidationResult::ok();

    for scan in scan_set {
        let current: Vec<(Key, u64)> = store
            .scan_prefix(&scan.prefix)?
            .into_iter()
            .map(|(k, vv)| (k, vv.version))
            .collect();
        if current != scan.entries {
            result.conflicts.push(ConflictType::PhantomConflict {
                prefix: scan.prefix.clone(),
                read_count: scan.entries.len(),
                current_count: current.len(),
            });
        }
    }

    Ok(result)
}

/// Validate a transaction for commit
///
/// A transaction that read nothing always validates.
pub fn validate_transaction<S: Storage>(
    txn: &TransactionContext,
    store: &S,
) -> Result<ValidationResult> {
    if txn.read_set.is_empty() && txn.scan_set.is_empty() {
        return Ok(ValidationResult::ok());
    }

    let mut result = ValidationResult::ok();
    result.merge(validate_read_set(&txn.read_set, store)?);
    result.merge(validate_scan_set(&txn.scan_set, store)?);
    Ok(result)
}
