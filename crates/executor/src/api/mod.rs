//! High-level typed wrapper for the Executor.
//!
//! The [`Genesis`] struct provides a convenient Rust API that wraps the
//! [`Executor`] and [`Command`]/[`Output`] enums with typed method calls.
//!
//! ## Bootstrap accounts
//!
//! Accounts listed under `[[users]]` in the configuration are created when
//! the database opens, unless an account of that name already exists. An
//! existing account is left untouched, password included.
//!
//! # Example
//!
//! ```text
//! use genesis_executor::Genesis;
//!
//! let app = Genesis::open("/var/lib/genesis")?;
//!
//! let (token, _) = app.login("admin", "change-me-please")?;
//! app.create_user(&token, "alice", "wonderland", false)?;
//!
//! let (alice, _) = app.login("alice", "wonderland")?;
//! app.set_data(&alice, "settings", r#"{ "theme": "dark" }"#)?;
//! assert_eq!(app.get_data(&alice, "settings")?, r#"{"theme":"dark"}"#);
//! ```

mod auth;
mod data;
mod user;

use std::path::Path;
use std::sync::Arc;

use genesis_engine::{Database, GenesisConfig};
use tracing::info;

use crate::bridge::{validate_name, validate_password, Primitives};
use crate::convert::convert_result;
use crate::{Command, Error, Executor, Output, Result};

/// High-level typed wrapper for backend operations.
///
/// Cheap to share: every method takes `&self`, and the underlying executor
/// is `Send + Sync`.
pub struct Genesis {
    executor: Executor,
}

impl Genesis {
    /// Open a database at the given path.
    ///
    /// The directory and a commented `genesis.toml` are created if missing;
    /// the configuration is read from that file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = convert_result(Database::open(path))?;
        Self::from_database(db)
    }

    /// Open a database at the given path with an explicit configuration.
    ///
    /// `genesis.toml` is neither read nor written.
    pub fn with_config<P: AsRef<Path>>(path: P, config: GenesisConfig) -> Result<Self> {
        let db = convert_result(Database::open_with_config(path, config))?;
        Self::from_database(db)
    }

    /// Create an in-memory instance with default configuration.
    ///
    /// Useful for tests. All data is lost when the instance is dropped.
    pub fn ephemeral() -> Result<Self> {
        Self::ephemeral_with_config(GenesisConfig::default())
    }

    /// Create an in-memory instance with an explicit configuration.
    pub fn ephemeral_with_config(config: GenesisConfig) -> Result<Self> {
        let db = convert_result(Database::ephemeral_with_config(config))?;
        Self::from_database(db)
    }

    /// Wrap an already open database and create its bootstrap accounts.
    pub fn from_database(db: Arc<Database>) -> Result<Self> {
        let primitives = convert_result(Primitives::new(db))?;
        bootstrap(&primitives)?;
        Ok(Self {
            executor: Executor::new(Arc::new(primitives)),
        })
    }

    /// The executor behind this wrapper, for command-level access.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// The underlying database.
    pub fn database(&self) -> &Arc<Database> {
        &self.executor.primitives().db
    }

    /// Check the backend is alive; returns the crate version.
    pub fn ping(&self) -> Result<String> {
        match self.executor.execute(Command::Ping)? {
            Output::Pong { version } => Ok(version),
            _ => Err(unexpected("Ping")),
        }
    }

    /// Stop background work and sync the log. Later commands fail.
    pub fn shutdown(&self) -> Result<()> {
        convert_result(self.database().shutdown())
    }
}

fn bootstrap(p: &Primitives) -> Result<()> {
    for user in &p.db.config().users {
        validate_name(&user.name)?;
        validate_password(&user.password)?;
        if convert_result(p.registry.ensure(&user.name, &user.password, user.admin))? {
            info!(user = %user.name, admin = user.admin, "bootstrap account created");
        }
    }
    Ok(())
}

fn unexpected(command: &str) -> Error {
    Error::Internal {
        reason: format!("Unexpected output for {}", command),
    }
}
