//! Append-only WAL writer
//!
//! One record per committed transaction. The caller serializes appends
//! (the engine holds its commit lock while appending).
//!
//! The writer tracks the length of the valid log. A failed write is cut
//! back to that length, so the next record never lands behind garbage.
//! A failed fsync poisons the writer: the record is in the file and will
//! replay, so no further appends are accepted on top of an unknown state.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use genesis_core::{GenesisError, Result};
use thiserror::Error;
use tracing::{error, info, trace};

use crate::mode::DurabilityMode;
use crate::record::WalRecord;

/// File operations the writer needs beyond `Write`
pub trait LogFile: Write + Send {
    /// Cut the file to `len` bytes
    fn set_len(&mut self, len: u64) -> io::Result<()>;
    /// Force written data to stable storage
    fn sync_data(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }
}

/// Why an append did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    /// Nothing from this record remains in the log
    #[error("wal append rolled back: {0}")]
    RolledBack(String),

    /// The record is in the log but was not synced; the writer is now poisoned
    #[error("wal record written but not synced: {0}")]
    Unsynced(String),

    /// The writer refused the record because of an earlier failure
    #[error("wal writer is poisoned: {0}")]
    Poisoned(String),
}

impl From<AppendError> for GenesisError {
    fn from(e: AppendError) -> Self {
        GenesisError::storage(e.to_string())
    }
}

/// Appender for the log file
pub struct WalWriter<F: LogFile = File> {
    path: PathBuf,
    file: F,
    len: u64,
    mode: DurabilityMode,
    unsynced_commits: usize,
    last_sync: Instant,
    poisoned: Option<String>,
}

impl WalWriter<File> {
    /// Open (or create) the log at `path` for appending
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len = file.metadata()?.len();
        Ok(Self::with_file(path, file, len, mode))
    }

    /// Atomically replace the whole log with `records`
    ///
    /// The records are written to a sibling file, synced and renamed over
    /// the log. Returns the new log length. A failure before the rename
    /// leaves the old log in place; a failure after it poisons the writer.
    pub fn replace_with(&mut self, records: &[WalRecord]) -> Result<u64> {
        self.check_poisoned()?;

        let tmp_path = self.path.with_extension("log.compact");
        let mut written = 0u64;
        {
            let mut tmp = File::create(&tmp_path)?;
            for record in records {
                let bytes = record.to_bytes()?;
                tmp.write_all(&bytes)?;
                written += bytes.len() as u64;
            }
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let reopened = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .and_then(|file| sync_parent_dir(&self.path).map(|_| file));
        match reopened {
            Ok(file) => {
                self.file = file;
                self.len = written;
                self.unsynced_commits = 0;
                self.last_sync = Instant::now();
                info!(path = %self.path.display(), bytes = written, "wal replaced");
                Ok(written)
            }
            Err(e) => Err(self.poison(format!("reopen after replace failed: {}", e))),
        }
    }
}

impl<F: LogFile> WalWriter<F> {
    /// Wrap an already positioned log file whose valid length is `len`
    pub fn with_file(path: PathBuf, file: F, len: u64, mode: DurabilityMode) -> Self {
        WalWriter {
            path,
            file,
            len,
            mode,
            unsynced_commits: 0,
            last_sync: Instant::now(),
            poisoned: None,
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes of valid log written so far
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if no record has been written
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The failure that poisoned this writer, if any
    pub fn poisoned(&self) -> Option<&str> {
        self.poisoned.as_deref()
    }

    /// Append one record and apply the sync policy of the durability mode
    ///
    /// The record is handed to the OS before returning in every mode.
    pub fn append(&mut self, record: &WalRecord) -> std::result::Result<(), AppendError> {
        if let Some(reason) = &self.poisoned {
            return Err(AppendError::Poisoned(reason.clone()));
        }
        let bytes = record
            .to_bytes()
            .map_err(|e| AppendError::RolledBack(e.to_string()))?;

        if let Err(e) = self.file.write_all(&bytes).and_then(|_| self.file.flush()) {
            return Err(self.roll_back(e));
        }
        self.len += bytes.len() as u64;
        self.unsynced_commits += 1;

        let must_sync = match self.mode {
            DurabilityMode::Always => true,
            DurabilityMode::Standard {
                interval_ms,
                batch_size,
            } => {
                self.unsynced_commits >= batch_size
                    || self.last_sync.elapsed() >= Duration::from_millis(interval_ms)
            }
            DurabilityMode::Cache => false,
        };
        if must_sync {
            if let Err(e) = self.sync() {
                return Err(AppendError::Unsynced(e.to_string()));
            }
        }

        trace!(version = record.version, bytes = bytes.len(), "wal append");
        Ok(())
    }

    /// Fsync everything written so far
    ///
    /// A failure poisons the writer.
    pub fn sync(&mut self) -> Result<()> {
        self.check_poisoned()?;
        let synced = self.file.flush().and_then(|_| self.file.sync_data());
        match synced {
            Ok(()) => {
                self.unsynced_commits = 0;
                self.last_sync = Instant::now();
                Ok(())
            }
            Err(e) => Err(self.poison(format!("fsync failed: {}", e))),
        }
    }

    /// Commits appended since the last fsync
    pub fn unsynced_commits(&self) -> usize {
        self.unsynced_commits
    }

    fn check_poisoned(&self) -> Result<()> {
        match &self.poisoned {
            Some(reason) => Err(AppendError::Poisoned(reason.clone()).into()),
            None => Ok(()),
        }
    }

    fn poison(&mut self, reason: String) -> GenesisError {
        error!(path = %self.path.display(), reason = %reason, "wal writer poisoned");
        self.poisoned = Some(reason.clone());
        AppendError::Poisoned(reason).into()
    }

    fn roll_back(&mut self, cause: io::Error) -> AppendError {
        match self.file.set_len(self.len) {
            Ok(()) => AppendError::RolledBack(cause.to_string()),
            Err(e) => {
                let reason = format!("append failed ({}) and rollback failed ({})", cause, e);
                self.poison(reason.clone());
                AppendError::Poisoned(reason)
            }
        }
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => File::open(dir)?.sync_all(),
        _ => Ok(()),
    }
}

// Directories cannot be opened for syncing here.
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}
