//! Database struct and open/close logic
//!
//! This module provides the main Database struct that orchestrates:
//! - Storage initialization
//! - WAL opening and replay on startup
//! - The TTL cleaner and WAL flush background threads
//! - Log compaction once `wal.log` outgrows its threshold
//! - Transaction API
//!
//! ## Transaction API
//!
//! 1. **Closure API** (recommended): `db.transaction(|txn| { ... })`
//!    - Automatic commit on success, abort on error
//!    - Returns the closure's return value
//!
//! 2. **Manual API**: `begin_transaction()` + `commit_transaction()`
//!    - For cases requiring external control over commit timing

pub mod config;
mod transactions;

pub use config::{BootstrapUser, GenesisConfig, CONFIG_FILE_NAME};
pub use transactions::RetryConfig;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use genesis_concurrency::{TransactionContext, TransactionManager};
use genesis_core::{GenesisError, Key, Limits, Result, Storage, Timestamp, VersionedValue};
use genesis_durability::{
    checkpoint_records, CompactInfo, DurabilityMode, WalReader, WalWriter, WAL_FILE_NAME,
};
use genesis_storage::{TTLCleaner, UnifiedStore};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Lock file guarding a data directory against a second process.
const LOCK_FILE_NAME: &str = ".lock";

/// What WAL replay restored at open
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Committed transactions replayed
    pub records_replayed: usize,
    /// Writes skipped because their expiry had already passed
    pub expired_skipped: usize,
    /// Bytes cut from a torn log tail
    pub truncated_bytes: u64,
}

/// Main database handle
///
/// Shared as `Arc<Database>` by every component; all methods take `&self`.
pub struct Database {
    /// Data directory; `None` for ephemeral databases
    data_dir: Option<PathBuf>,
    storage: Arc<UnifiedStore>,
    /// Present for disk databases
    wal_writer: Option<Arc<Mutex<WalWriter>>>,
    manager: TransactionManager,
    durability_mode: DurabilityMode,
    config: GenesisConfig,
    recovery: RecoveryStats,
    accepting_transactions: AtomicBool,
    cleaner: TTLCleaner,
    /// Log length at which the next commit triggers compaction
    compact_at: AtomicU64,
    flush_shutdown: Arc<AtomicBool>,
    flush_handle: Mutex<Option<JoinHandle<()>>>,
    /// Held for the lifetime of the Database, released on drop
    _lock_file: Option<File>,
}

impl Database {
    /// Open database at given path with automatic recovery
    ///
    /// Reads `genesis.toml` from the data directory. If no config file
    /// exists, one is created with commented defaults.
    ///
    /// # Flow
    ///
    /// 1. Create data directory if needed
    /// 2. Read or create `genesis.toml`
    /// 3. Take the directory lock
    /// 4. Replay `wal.log`, truncating a torn tail
    /// 5. Start background threads
    /// 6. Compact the log if it is already over its threshold
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        GenesisConfig::write_default_if_missing(&config_path)?;
        let cfg = GenesisConfig::from_file(&config_path)?;

        Self::open_with_config(path, cfg)
    }

    /// Open database at the given path with an explicit configuration.
    ///
    /// The supplied config is not written to `genesis.toml`: it may carry a
    /// token secret and bootstrap passwords.
    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: GenesisConfig) -> Result<Arc<Self>> {
        cfg.validate()?;
        let durability_mode = cfg.durability_mode()?;

        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let lock_path = data_dir.join(LOCK_FILE_NAME);
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| GenesisError::storage(format!("failed to open lock file: {}", e)))?;
        fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| {
            GenesisError::storage(format!(
                "database at '{}' is already in use by another process",
                data_dir.display()
            ))
        })?;

        let wal_path = data_dir.join(WAL_FILE_NAME);
        let storage = Arc::new(UnifiedStore::new());
        let recovery = Self::recover(&wal_path, &storage)?;

        let wal = Arc::new(Mutex::new(WalWriter::open(&wal_path, durability_mode)?));

        let flush_shutdown = Arc::new(AtomicBool::new(false));
        let flush_handle = match durability_mode {
            DurabilityMode::Standard { interval_ms, .. } => Some(spawn_flush_thread(
                Arc::clone(&wal),
                Arc::clone(&flush_shutdown),
                Duration::from_millis(interval_ms),
            )?),
            _ => None,
        };

        info!(
            path = %data_dir.display(),
            mode = durability_mode.description(),
            records = recovery.records_replayed,
            keys = storage.len(),
            "opened database"
        );

        let stop_flush = Arc::clone(&flush_shutdown);
        let db = Self::assemble(
            Some(data_dir),
            storage,
            Some(wal),
            durability_mode,
            cfg,
            recovery,
            flush_shutdown,
            flush_handle,
            Some(lock_file),
        )
        .map_err(|e| {
            stop_flush.store(true, Ordering::SeqCst);
            e
        })?;
        db.compact_if_due();
        Ok(Arc::new(db))
    }

    /// Create an in-memory database with default configuration
    ///
    /// No files are created and all data is lost on drop.
    pub fn ephemeral() -> Result<Arc<Self>> {
        Self::ephemeral_with_config(GenesisConfig::default())
    }

    /// Create an in-memory database with an explicit configuration
    ///
    /// The durability setting is ignored.
    pub fn ephemeral_with_config(cfg: GenesisConfig) -> Result<Arc<Self>> {
        cfg.validate()?;
        debug!("opened ephemeral database");
        let db = Self::assemble(
            None,
            Arc::new(UnifiedStore::new()),
            None,
            DurabilityMode::Cache,
            cfg,
            RecoveryStats::default(),
            Arc::new(AtomicBool::new(false)),
            None,
            None,
        )?;
        Ok(Arc::new(db))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        data_dir: Option<PathBuf>,
        storage: Arc<UnifiedStore>,
        wal_writer: Option<Arc<Mutex<WalWriter>>>,
        durability_mode: DurabilityMode,
        config: GenesisConfig,
        recovery: RecoveryStats,
        flush_shutdown: Arc<AtomicBool>,
        flush_handle: Option<JoinHandle<()>>,
        lock_file: Option<File>,
    ) -> Result<Self> {
        let cleaner = TTLCleaner::new(Arc::clone(&storage), config.ttl_cleanup_interval());
        cleaner.start().map_err(|e| {
            GenesisError::internal(format!("failed to spawn TTL cleaner thread: {}", e))
        })?;
        // The manager continues numbering from whatever replay restored.
        let manager = TransactionManager::new(storage.current_version());
        let compact_at = AtomicU64::new(config.wal_compact_bytes());

        Ok(Database {
            data_dir,
            storage,
            wal_writer,
            manager,
            durability_mode,
            config,
            recovery,
            accepting_transactions: AtomicBool::new(true),
            cleaner,
            compact_at,
            flush_shutdown,
            flush_handle: Mutex::new(flush_handle),
            _lock_file: lock_file,
        })
    }

    /// Replay every intact record of the log into `storage`
    fn recover(wal_path: &Path, storage: &UnifiedStore) -> Result<RecoveryStats> {
        let outcome = WalReader::read_all(wal_path)?;
        let now = Timestamp::now();
        let mut stats = RecoveryStats::default();

        for record in outcome.records {
            let mut writes = Vec::with_capacity(record.writes.len());
            let mut deletes = record.deletes;
            for write in record.writes {
                match write.expires_at {
                    Some(deadline) if deadline.has_passed_at(now) => {
                        // Dead on arrival; still shadows an older value.
                        stats.expired_skipped += 1;
                        deletes.push(write.key);
                    }
                    _ => writes.push((write.key, write.value, write.expires_at)),
                }
            }
            storage.apply_batch(&writes, &deletes, record.version)?;
            stats.records_replayed += 1;
        }

        if outcome.torn_tail.is_some() {
            let file_len = std::fs::metadata(wal_path)?.len();
            stats.truncated_bytes = file_len.saturating_sub(outcome.valid_len);
            warn!(
                path = %wal_path.display(),
                valid_len = outcome.valid_len,
                truncated = stats.truncated_bytes,
                "truncating torn wal tail"
            );
            WalReader::truncate(wal_path, outcome.valid_len)?;
        }

        if stats.records_replayed > 0 {
            info!(
                records = stats.records_replayed,
                expired_skipped = stats.expired_skipped,
                version = storage.current_version(),
                "wal recovery complete"
            );
        }
        Ok(stats)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Data directory, `None` when ephemeral
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// True for in-memory databases
    pub fn is_ephemeral(&self) -> bool {
        self.data_dir.is_none()
    }

    /// True until `shutdown()` is called
    pub fn is_open(&self) -> bool {
        self.accepting_transactions.load(Ordering::SeqCst)
    }

    /// Durability mode in effect
    pub fn durability_mode(&self) -> DurabilityMode {
        self.durability_mode
    }

    /// Configuration the database was opened with
    pub fn config(&self) -> &GenesisConfig {
        &self.config
    }

    /// Quota and size limits derived from the configuration
    pub fn limits(&self) -> Limits {
        self.config.limits()
    }

    /// What replay restored at open
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery
    }

    /// Underlying store
    pub fn storage(&self) -> &Arc<UnifiedStore> {
        &self.storage
    }

    /// Latest committed version
    pub fn current_version(&self) -> u64 {
        self.manager.current_version()
    }

    // ========================================================================
    // Reads outside transactions
    // ========================================================================

    /// Point lookup of the latest committed value
    pub fn get(&self, key: &Key) -> Result<Option<VersionedValue>> {
        self.storage.get(key)
    }

    /// Ordered scan of the latest committed values under `prefix`
    pub fn scan_prefix(&self, prefix: &Key) -> Result<Vec<(Key, VersionedValue)>> {
        self.storage.scan_prefix(prefix)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    fn check_accepting(&self) -> Result<()> {
        if !self.accepting_transactions.load(Ordering::SeqCst) {
            return Err(GenesisError::invalid_input(
                "Database is shutting down".to_string(),
            ));
        }
        Ok(())
    }

    /// Execute one transaction attempt: commit on success, abort on error.
    fn run_single_attempt<T>(&self, txn: &mut TransactionContext, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.commit_transaction(txn)?;
                Ok(value)
            }
            Err(e) => {
                if txn.is_active() {
                    let _ = self
                        .manager
                        .abort(txn, format!("Closure error: {}", e));
                }
                Err(e)
            }
        }
    }

    /// Execute a transaction with the given closure
    ///
    /// Commits when the closure returns `Ok`, aborts on every error path.
    /// A validation failure surfaces as `Conflict`.
    ///
    /// # Example
    /// ```text
    /// let exists = db.transaction(|txn| txn.exists(&key))?;
    /// ```
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TransactionContext) -> Result<T>,
    {
        self.check_accepting()?;
        let mut txn = self.begin_transaction();
        let result = f(&mut txn);
        self.run_single_attempt(&mut txn, result)
    }

    /// Execute a transaction with automatic retry on conflict
    ///
    /// The closure is called repeatedly until either:
    /// - The transaction commits successfully
    /// - A non-conflict error occurs (not retried)
    /// - Maximum retries are exceeded (the last `Conflict` is returned)
    pub fn transaction_with_retry<F, T>(&self, config: RetryConfig, f: F) -> Result<T>
    where
        F: Fn(&mut TransactionContext) -> Result<T>,
    {
        self.check_accepting()?;

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            let mut txn = self.begin_transaction();
            let result = f(&mut txn);

            match self.run_single_attempt(&mut txn, result) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_conflict() && attempt < config.max_retries => {
                    debug!(attempt, error = %e, "transaction conflict, retrying");
                    last_error = Some(e);
                    std::thread::sleep(config.calculate_delay(attempt));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GenesisError::internal("retry loop exited without returning a result".to_string())
        }))
    }

    /// Begin a new transaction (for manual control)
    ///
    /// Prefer the `transaction()` closure API.
    pub fn begin_transaction(&self) -> TransactionContext {
        self.manager.begin(&self.storage)
    }

    /// Commit a manually managed transaction, returning its commit version
    pub fn commit_transaction(&self, txn: &mut TransactionContext) -> Result<u64> {
        let version = self
            .manager
            .commit(txn, &self.storage, self.wal_writer.as_deref())
            .map_err(GenesisError::from)?;
        self.compact_if_due();
        Ok(version)
    }

    // ========================================================================
    // Compaction
    // ========================================================================

    /// Rewrite `wal.log` as a checkpoint of the entries live right now
    ///
    /// Overwritten values, deletes and expired entries (revocation markers
    /// included) drop out of the log. Commits wait while the checkpoint is
    /// written. A no-op for ephemeral databases.
    pub fn compact(&self) -> Result<CompactInfo> {
        let Some(wal) = &self.wal_writer else {
            return Ok(CompactInfo::default());
        };

        self.manager.with_commits_paused(|| {
            let mut wal = wal.lock();
            let bytes_before = wal.len();
            let entries = self.storage.live_entries(Timestamp::now());
            let live_entries = entries.len();
            let records = checkpoint_records(self.manager.current_version(), entries);
            let records_written = records.len();
            let bytes_after = wal.replace_with(&records)?;

            let threshold = self.config.wal_compact_bytes().max(bytes_after.saturating_mul(2));
            self.compact_at.store(threshold, Ordering::SeqCst);

            let info = CompactInfo {
                bytes_before,
                bytes_after,
                live_entries,
                records_written,
            };
            info!(
                live_entries,
                bytes_before,
                bytes_after,
                next_at = threshold,
                "wal compacted"
            );
            Ok(info)
        })
    }

    /// Current length of `wal.log`; 0 for ephemeral databases
    pub fn wal_len(&self) -> u64 {
        self.wal_writer.as_ref().map(|w| w.lock().len()).unwrap_or(0)
    }

    fn compact_if_due(&self) {
        if self.wal_writer.is_none() || self.wal_len() < self.compact_at.load(Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.compact() {
            warn!(error = %e, "wal compaction failed");
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Force every appended record to disk
    pub fn flush(&self) -> Result<()> {
        if let Some(wal) = &self.wal_writer {
            wal.lock().sync()?;
        }
        Ok(())
    }

    fn stop_background(&self) {
        self.cleaner.stop();

        if let Some(handle) = self.flush_handle.lock().take() {
            stop_flush_thread(&self.flush_shutdown, handle);
        }
    }

    /// Stop accepting transactions, stop background threads and sync the log
    ///
    /// # Example
    ///
    /// ```text
    /// db.shutdown()?;
    /// assert!(!db.is_open());
    /// ```
    pub fn shutdown(&self) -> Result<()> {
        self.accepting_transactions.store(false, Ordering::SeqCst);
        self.stop_background();
        self.flush()?;
        info!("database shut down");
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.stop_background();
        if let Err(e) = self.flush() {
            warn!(error = %e, "final wal sync failed");
        }
    }
}

/// Periodically fsync the log in `Standard` mode
///
/// Sleeps with `park_timeout`, so `stop_flush_thread` wakes it at once.
fn spawn_flush_thread(
    wal: Arc<Mutex<WalWriter>>,
    shutdown: Arc<AtomicBool>,
    interval: Duration,
) -> Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("genesis-wal-flush".to_string())
        .spawn(move || {
            while !shutdown.load(Ordering::SeqCst) {
                std::thread::park_timeout(interval);
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                let mut wal = wal.lock();
                if wal.poisoned().is_none() && wal.unsynced_commits() > 0 {
                    if let Err(e) = wal.sync() {
                        warn!(error = %e, "periodic wal sync failed");
                    }
                }
            }
        })
        .map_err(|e| GenesisError::internal(format!("failed to spawn WAL flush thread: {}", e)))
}

fn stop_flush_thread(shutdown: &AtomicBool, handle: JoinHandle<()>) {
    shutdown.store(true, Ordering::SeqCst);
    handle.thread().unpark();
    let _ = handle.join();
}
