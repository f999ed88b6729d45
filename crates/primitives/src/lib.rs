//! Primitives layer for genesis
//!
//! Provides the account and data services as stateless facades over the
//! Database engine:
//! - **UserRegistry**: accounts, password authentication, cascade delete
//! - **DataStore**: per-owner key → JSON documents with quota and size limits
//! - **SessionService**: signed session tokens and the revocation set
//!
//! ## Design Principle: Stateless Facades
//!
//! Each primitive holds an `Arc<Database>` plus the collaborators it was
//! constructed with and delegates all state to the transactional engine:
//!
//! - Multiple primitive instances on the same Database are safe
//! - No warm-up or cache invalidation concerns
//! - Every request may run on its own thread
//!
//! ## Namespace Isolation
//!
//! Accounts, data items and revocation markers share one ordered key space.
//! The length-prefixed [`Key`](genesis_core::Key) encoding keeps each kind
//! and each owner in a disjoint prefix range.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod data;
pub mod registry;
pub mod session;

pub use data::DataStore;
pub use registry::{Account, AccountDeletion, AccountInfo, AccountUpdate, UserRegistry};
pub use session::{Claims, SessionService};

use genesis_engine::RetryConfig;

/// Retry budget for read-modify-write transactions
///
/// Every conflict means another writer committed, so a bounded budget is
/// exhausted only under sustained contention on one owner.
pub(crate) fn write_retry() -> RetryConfig {
    RetryConfig::default().with_max_retries(32)
}
