//! WAL replay
//!
//! Records are decoded front to back. The first record that is short or
//! fails its checksum ends replay: everything from there on is a torn tail
//! from an interrupted append and is reported so the caller can truncate it.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use genesis_core::Result;
use tracing::warn;

use crate::record::{WalRecord, WalRecordError};

/// Result of reading a log file
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    /// Records decoded in order
    pub records: Vec<WalRecord>,
    /// Length of the valid prefix of the file
    pub valid_len: u64,
    /// Why replay stopped early, if it did
    pub torn_tail: Option<WalRecordError>,
}

/// Reads every intact record from a log file
pub struct WalReader;

impl WalReader {
    /// Read all records from `path`
    ///
    /// A missing file is an empty log.
    pub fn read_all(path: impl AsRef<Path>) -> Result<ReplayOutcome> {
        let bytes = match fs::read(path.as_ref()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ReplayOutcome::default()),
            Err(e) => return Err(e.into()),
        };

        let mut outcome = ReplayOutcome::default();
        let mut offset = 0usize;
        while offset < bytes.len() {
            match WalRecord::from_bytes(&bytes[offset..]) {
                Ok((record, consumed)) => {
                    outcome.records.push(record);
                    offset += consumed;
                }
                Err(e) => {
                    warn!(
                        offset,
                        file_len = bytes.len(),
                        error = %e,
                        "wal replay stopped at damaged record"
                    );
                    outcome.torn_tail = Some(e);
                    break;
                }
            }
        }
        outcome.valid_len = offset as u64;
        Ok(outcome)
    }

    /// Cut the log back to `len` bytes, discarding a torn tail
    pub fn truncate(path: impl AsRef<Path>, len: u64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(path.as_ref())?;
        file.set_len(len)?;
        file.sync_all()?;
        Ok(())
    }
}
