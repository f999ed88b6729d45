//! Log compaction
//!
//! The log only grows: overwrites, deletes and revocation markers that
//! have long expired all stay in it and are replayed on every open.
//! Compaction rewrites it as a checkpoint of the live entries, which
//! replays to the same state.
//!
//! A checkpoint is one or more records sharing the store's current
//! version, so replay restores the version counter too. Entries are split
//! across records to keep each record well under the `u32` frame limit.

use genesis_core::{Key, Timestamp};

use crate::record::{WalRecord, WalWrite};

/// Upper bound on value bytes per checkpoint record
pub const CHECKPOINT_RECORD_BYTES: usize = 8 * 1024 * 1024;

/// What a compaction did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactInfo {
    /// Log length before compaction
    pub bytes_before: u64,
    /// Log length after compaction
    pub bytes_after: u64,
    /// Live entries written to the checkpoint
    pub live_entries: usize,
    /// Records the checkpoint consists of
    pub records_written: usize,
}

impl CompactInfo {
    /// Bytes the log shrank by
    pub fn reclaimed_bytes(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Build checkpoint records for `entries` at `version`
///
/// Always returns at least one record, so an empty store still restores
/// its version.
pub fn checkpoint_records(
    version: u64,
    entries: Vec<(Key, Vec<u8>, Option<Timestamp>)>,
) -> Vec<WalRecord> {
    let mut records = Vec::new();
    let mut batch = Vec::new();
    let mut batch_bytes = 0usize;

    for (key, value, expires_at) in entries {
        let size = key.as_bytes().len() + value.len();
        if !batch.is_empty() && batch_bytes + size > CHECKPOINT_RECORD_BYTES {
            records.push(WalRecord::new(version, std::mem::take(&mut batch), Vec::new()));
            batch_bytes = 0;
        }
        batch_bytes += size;
        batch.push(WalWrite {
            key,
            value,
            expires_at,
        });
    }
    if !batch.is_empty() || records.is_empty() {
        records.push(WalRecord::new(version, batch, Vec::new()));
    }
    records
}
