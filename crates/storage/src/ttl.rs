//! Deadline index over expiring entries
//!
//! Only revocation markers carry a deadline today, so the index stays small
//! next to the store. Keys are bucketed by deadline; a sweep walks the
//! buckets up to `now` and never touches live ones.

use genesis_core::{Key, Timestamp};
use std::collections::{BTreeMap, HashSet};

/// Deadline → keys expiring at that instant
#[derive(Debug, Default)]
pub struct TTLIndex {
    buckets: BTreeMap<Timestamp, HashSet<Key>>,
}

impl TTLIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `key` as expiring at `deadline`
    pub fn insert(&mut self, deadline: Timestamp, key: Key) {
        self.buckets.entry(deadline).or_default().insert(key);
    }

    /// Stop tracking `key` under `deadline`; empty buckets are dropped
    pub fn remove(&mut self, deadline: Timestamp, key: &Key) {
        let emptied = match self.buckets.get_mut(&deadline) {
            Some(keys) => keys.remove(key) && keys.is_empty(),
            None => false,
        };
        if emptied {
            self.buckets.remove(&deadline);
        }
    }

    /// Keys whose deadline has passed at `now` (deadline `<= now`)
    pub fn find_expired(&self, now: Timestamp) -> Vec<Key> {
        self.buckets
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Earliest tracked deadline
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.buckets.keys().next().copied()
    }

    /// True when nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.buckets.values().map(HashSet::len).sum()
    }
}
