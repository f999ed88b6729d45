//! Concurrency layer for genesis
//!
//! Optimistic concurrency control over the unified store:
//! - TransactionContext: read/write/delete set tracking over a snapshot
//! - Scan tracking, so a prefix scan that would return a different set of
//!   keys at commit time is a conflict (phantom protection)
//! - Conflict detection at commit time, first committer wins
//! - TransactionManager: serialized validate → log → apply

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;
pub mod validation;

pub use manager::TransactionManager;
pub use transaction::{CommitError, PendingOperations, TransactionContext, TransactionStatus};
pub use validation::{validate_transaction, ConflictType, ValidationResult};
