//! Durability layer for genesis
//!
//! Committed transactions are appended to a single write-ahead log file,
//! one CRC-protected record per commit, and replayed in order on open.
//!
//! - `DurabilityMode`: when the log is fsynced
//! - `WalRecord`: record framing and payload
//! - `WalWriter` / `WalReader`: append and replay
//! - `compaction`: rewriting the log as a checkpoint of live entries

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compaction;
pub mod mode;
pub mod reader;
pub mod record;
pub mod writer;

pub use compaction::{checkpoint_records, CompactInfo};
pub use mode::DurabilityMode;
pub use reader::{ReplayOutcome, WalReader};
pub use record::{WalRecord, WalRecordError, WalWrite, WAL_RECORD_FORMAT_VERSION};
pub use writer::{AppendError, LogFile, WalWriter};

/// File name of the log inside a database directory
pub const WAL_FILE_NAME: &str = "wal.log";
