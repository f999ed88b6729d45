//! Storage layer for genesis
//!
//! This crate implements the in-memory storage backend with:
//! - UnifiedStore: BTreeMap-based storage with RwLock
//! - StoredValue: versioned value with optional absolute expiry
//! - TTL index for expiration
//! - TTL cleaner background task
//! - Version management with AtomicU64
//! - StoreSnapshot, a copy-on-read view for transactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleaner;
pub mod snapshot;
pub mod stored_value;
pub mod ttl;
pub mod unified;

pub use cleaner::TTLCleaner;
pub use snapshot::StoreSnapshot;
pub use stored_value::StoredValue;
pub use ttl::TTLIndex;
pub use unified::UnifiedStore;
