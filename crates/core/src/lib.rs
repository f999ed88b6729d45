//! Core types and traits for genesis
//!
//! This crate defines the foundational types used throughout the system:
//! - Key / TypeTag: flat key-space encoding of accounts, data items and
//!   revoked sessions
//! - Timestamp: microsecond wall-clock time
//! - Limits: per-owner quota and document size
//! - GenesisError: error taxonomy
//! - Traits: Storage and SnapshotView

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod timestamp;
pub mod traits;
pub mod types;
pub mod versioned;

pub use error::{GenesisError, Result};
pub use limits::{Limits, DEFAULT_KEYS_PER_USER, DEFAULT_MAX_DATA_BYTES};
pub use timestamp::Timestamp;
pub use traits::{SnapshotView, Storage};
pub use types::{Key, TypeTag};
pub use versioned::VersionedValue;
