//! DataStore: per-owner key → JSON documents
//!
//! ## Design
//!
//! Items live under `Key::new_data(owner, key)`; the owner's prefix
//! `Key::new_data_prefix(owner)` covers exactly their items, so counting
//! and aggregation are prefix scans.
//!
//! Values are stored as the raw JSON bytes the caller supplied.
//!
//! ## Quota
//!
//! - `set` writes unconditionally; pairing it with `count` is a soft limit.
//! - `set_within_quota` counts and inserts in one transaction whose scan
//!   is revalidated at commit, so racing inserts cannot overshoot.

use std::sync::Arc;

use genesis_core::{GenesisError, Key, Limits, Result};
use genesis_engine::Database;
use serde::de::IgnoredAny;

use crate::write_retry;

/// Tenant data store
///
/// # Example
///
/// ```ignore
/// let data = DataStore::new(db.clone(), db.limits());
/// data.set("alice", "theme", br#""dark""#)?;
/// assert_eq!(data.get("alice", "theme")?, br#""dark""#.to_vec());
/// ```
#[derive(Clone)]
pub struct DataStore {
    db: Arc<Database>,
    limits: Limits,
}

impl DataStore {
    /// Create a store enforcing `limits`
    pub fn new(db: Arc<Database>, limits: Limits) -> Self {
        Self { db, limits }
    }

    /// Limits in force
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn validate_value(&self, value: &[u8]) -> Result<()> {
        self.limits.validate_data_size(value.len())?;
        serde_json::from_slice::<IgnoredAny>(value)
            .map_err(|e| GenesisError::InvalidJson(e.to_string()))?;
        Ok(())
    }

    /// Number of items `owner` holds
    pub fn count(&self, owner: &str) -> Result<usize> {
        Ok(self.db.scan_prefix(&Key::new_data_prefix(owner))?.len())
    }

    /// Store `value` under `key`, replacing any previous value
    ///
    /// Rejects values over the size limit and values that are not JSON.
    /// The quota is not checked.
    pub fn set(&self, owner: &str, key: &str, value: &[u8]) -> Result<()> {
        self.validate_value(value)?;
        let storage_key = Key::new_data(owner, key);
        self.db
            .transaction(|txn| txn.put(storage_key.clone(), value.to_vec()))
    }

    /// Store `value` unless it would take `owner` past their key quota
    ///
    /// Replacing an existing key never counts against the quota.
    pub fn set_within_quota(&self, owner: &str, key: &str, value: &[u8]) -> Result<()> {
        self.validate_value(value)?;
        let storage_key = Key::new_data(owner, key);
        let prefix = Key::new_data_prefix(owner);

        self.db.transaction_with_retry(write_retry(), |txn| {
            if !txn.exists(&storage_key)? {
                let count = txn.scan_prefix(&prefix)?.len();
                self.limits.validate_new_key(count)?;
            }
            txn.put(storage_key.clone(), value.to_vec())
        })
    }

    /// Fetch the value stored under `key`
    pub fn get(&self, owner: &str, key: &str) -> Result<Vec<u8>> {
        match self.db.get(&Key::new_data(owner, key))? {
            Some(stored) => Ok(stored.into_value()),
            None => Err(GenesisError::not_found(format!("data key '{}'", key))),
        }
    }

    /// Whether `key` holds a value
    pub fn exists(&self, owner: &str, key: &str) -> Result<bool> {
        Ok(self.db.get(&Key::new_data(owner, key))?.is_some())
    }

    /// Remove `key`; removing an absent key succeeds
    pub fn delete(&self, owner: &str, key: &str) -> Result<()> {
        let storage_key = Key::new_data(owner, key);
        self.db.transaction_with_retry(write_retry(), |txn| {
            if txn.exists(&storage_key)? {
                txn.delete(storage_key.clone())?;
            }
            Ok(())
        })
    }

    /// Every item of `owner` as one JSON object
    ///
    /// Stored values are spliced in verbatim; fields follow key order.
    pub fn get_all(&self, owner: &str) -> Result<Vec<u8>> {
        let items = self.db.scan_prefix(&Key::new_data_prefix(owner))?;

        let capacity = items.iter().map(|(_, v)| v.value.len() + 8).sum::<usize>();
        let mut out = Vec::with_capacity(capacity + 2);
        out.push(b'{');
        for (i, (key, stored)) in items.iter().enumerate() {
            let (item_owner, item_key) = key.decode_data()?;
            if item_owner != owner {
                return Err(GenesisError::corruption(format!(
                    "prefix scan for '{}' returned an item of '{}'",
                    owner, item_owner
                )));
            }
            if i > 0 {
                out.push(b',');
            }
            let quoted = serde_json::to_vec(&item_key)
                .map_err(|e| GenesisError::internal(format!("failed to encode key: {}", e)))?;
            out.extend_from_slice(&quoted);
            out.push(b':');
            out.extend_from_slice(&stored.value);
        }
        out.push(b'}');
        Ok(out)
    }

    /// Remove every item of `owner`, returning how many were removed
    pub fn delete_all(&self, owner: &str) -> Result<usize> {
        let prefix = Key::new_data_prefix(owner);
        self.db.transaction_with_retry(write_retry(), |txn| {
            let items = txn.scan_prefix(&prefix)?;
            let removed = items.len();
            for (key, _) in items {
                txn.delete(key)?;
            }
            Ok(removed)
        })
    }
}
