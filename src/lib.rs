//! Genesis - a private backend for small frontend apps
//!
//! Genesis keeps accounts, session tokens and per-account JSON documents in
//! an embedded, write-ahead-logged store.
//!
//! # Quick Start
//!
//! ```ignore
//! use genesis::Genesis;
//!
//! // In-memory instance; `Genesis::open(path)` persists to disk
//! let app = Genesis::ephemeral()?;
//!
//! let (token, _) = app.login("admin", "change-me-please")?;
//! app.set_data(&token, "settings", r#"{"theme":"dark"}"#)?;
//! let all = app.get_all_data(&token)?;
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`] which provides a command-based API.
//! The [`Genesis`] struct provides a convenient high-level interface.
//!
//! Internal implementation details (storage, concurrency, durability, engine)
//! are not exposed - only the executor API is public.

// Re-export the public API from genesis-executor
pub use genesis_executor::*;
