//! Database engine for genesis
//!
//! This crate orchestrates all lower layers:
//! - Database: open/close, ephemeral instances, configuration
//! - Transaction coordination with retry on conflict
//! - WAL recovery at open and log compaction
//! - Background tasks (TTL cleanup, periodic WAL sync)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;

pub use database::{
    BootstrapUser, Database, GenesisConfig, RecoveryStats, RetryConfig, CONFIG_FILE_NAME,
};
pub use genesis_durability::CompactInfo;
