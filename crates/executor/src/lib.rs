//! # Genesis Executor
//!
//! The public API for genesis, a private backend for small frontend apps:
//! accounts, session tokens and per-account JSON documents.
//!
//! This is the only crate users need to import. It provides:
//! - [`Genesis`] - The main interface with typed methods per operation
//! - [`Command`]/[`Output`] - Low-level command interface (for transports)
//! - [`Error`] - Serializable error type every operation returns
//!
//! ## Quick Start
//!
//! ```text
//! use genesis_executor::Genesis;
//!
//! let app = Genesis::open("/path/to/data")?;
//!
//! let (token, user) = app.login("alice", "wonderland")?;
//! app.set_data(&token, "settings", r#"{"theme":"dark"}"#)?;
//! let all = app.get_all_data(&token)?;
//! ```
//!
//! ## Authorization
//!
//! | Commands | Requires |
//! |----------|----------|
//! | `Ping`, `Login` | nothing |
//! | `Logout` | a valid token |
//! | `Session`, `UpdatePassword`, data commands | a token whose account still exists |
//! | `CreateUser`, `UpdateUser`, `DeleteUser`, `ListUsers` | an admin token |

#![warn(missing_docs)]

mod api;
pub(crate) mod bridge;
mod command;
mod convert;
mod error;
mod executor;
mod output;

// Handler modules
mod handlers;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API - Everything users need is re-exported here
// =============================================================================

pub use api::Genesis;
pub use bridge::Primitives;
pub use command::Command;
pub use error::Error;
pub use executor::Executor;
pub use output::Output;

// Re-export account views so users don't need genesis-primitives directly
pub use genesis_primitives::AccountInfo;

// Re-export configuration types so users don't need genesis-engine directly
pub use genesis_engine::{BootstrapUser, GenesisConfig};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
