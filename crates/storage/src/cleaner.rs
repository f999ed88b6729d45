//! Background reclamation of expired entries
//!
//! Reads already treat an entry as gone once its deadline passes; the
//! cleaner only frees the memory. It wakes every `interval`, asks the
//! [`TTLIndex`](crate::TTLIndex) which deadlines have passed and removes
//! those entries that are still expired under the write lock.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use genesis_core::Timestamp;
use parking_lot::Mutex;
use tracing::debug;

use crate::UnifiedStore;

/// Owns the cleanup thread of one store
///
/// ```ignore
/// let cleaner = TTLCleaner::new(Arc::clone(&store), Duration::from_secs(60));
/// cleaner.start()?;
/// // ...
/// cleaner.stop();
/// ```
pub struct TTLCleaner {
    store: Arc<UnifiedStore>,
    interval: Duration,
    stopping: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TTLCleaner {
    /// Cleaner for `store`, sweeping every `interval` once started
    pub fn new(store: Arc<UnifiedStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            stopping: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    /// Remove every entry expired at `now`; returns how many went
    pub fn sweep(store: &UnifiedStore, now: Timestamp) -> usize {
        store
            .find_expired_keys(now)
            .iter()
            .filter(|key| store.remove_if_expired(key, now))
            .count()
    }

    /// Spawn the `genesis-ttl-cleaner` thread. Calling it twice is a no-op.
    pub fn start(&self) -> io::Result<()> {
        let mut slot = self.thread.lock();
        if slot.is_some() {
            return Ok(());
        }

        let store = Arc::clone(&self.store);
        let stopping = Arc::clone(&self.stopping);
        let interval = self.interval;
        let handle = thread::Builder::new()
            .name("genesis-ttl-cleaner".to_string())
            .spawn(move || {
                let mut next = Instant::now() + interval;
                loop {
                    // stop() unparks us, so a long interval never delays shutdown
                    thread::park_timeout(next.saturating_duration_since(Instant::now()));
                    if stopping.load(Ordering::Acquire) {
                        return;
                    }
                    if Instant::now() < next {
                        continue;
                    }
                    let removed = Self::sweep(&store, Timestamp::now());
                    if removed > 0 {
                        debug!(removed, "ttl cleaner reclaimed expired entries");
                    }
                    next = Instant::now() + interval;
                }
            })?;
        *slot = Some(handle);
        Ok(())
    }

    /// Stop the thread and wait for it. Safe to call more than once.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        if let Some(handle) = self.thread.lock().take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }

    /// Whether `stop` has been called
    pub fn is_stopped(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }
}

impl Drop for TTLCleaner {
    fn drop(&mut self) {
        self.stop();
    }
}
