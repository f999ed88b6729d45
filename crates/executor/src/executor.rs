//! The Executor - single entry point to the genesis backend.
//!
//! The Executor is a stateless dispatcher that routes commands to the
//! appropriate primitive operations and converts results to outputs.

use std::sync::Arc;

use tracing::{debug, error};

use crate::bridge::Primitives;
use crate::handlers::{auth, data, user};
use crate::{Command, Output, Result};

/// The command executor.
///
/// The Executor is **stateless**: it holds references to the primitives
/// but maintains no state of its own. All state lives in the engine.
///
/// # Thread Safety
///
/// Executor is `Send + Sync`; clones share the same primitives and may be
/// used from any number of threads.
///
/// # Example
///
/// ```ignore
/// use genesis_executor::{Command, Executor};
///
/// let executor = Executor::new(primitives);
///
/// let output = executor.execute(Command::Login {
///     name: "alice".into(),
///     password: "wonderland".into(),
/// })?;
/// ```
#[derive(Clone)]
pub struct Executor {
    primitives: Arc<Primitives>,
}

impl Executor {
    /// Create a new executor over a set of primitives.
    pub fn new(primitives: Arc<Primitives>) -> Self {
        Self { primitives }
    }

    /// The primitives commands run against.
    pub fn primitives(&self) -> &Arc<Primitives> {
        &self.primitives
    }

    /// Execute a single command.
    ///
    /// `Internal` outcomes are logged at error level; every other failure
    /// is a routine outcome and logged at debug level.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        let name = cmd.name();
        let result = self.dispatch(cmd);
        if let Err(e) = &result {
            if e.is_internal() {
                error!(command = name, error = %e, "command failed");
            } else {
                debug!(command = name, kind = e.kind(), "command rejected");
            }
        }
        result
    }

    /// Execute commands in order, collecting each result.
    ///
    /// A failure does not stop the remaining commands.
    pub fn execute_many(&self, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(cmd)).collect()
    }

    fn dispatch(&self, cmd: Command) -> Result<Output> {
        let p = &self.primitives;
        match cmd {
            Command::Ping => Ok(Output::Pong {
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),

            // Auth commands
            Command::Login { name, password } => auth::login(p, name, password),
            Command::Logout { token } => auth::logout(p, token),
            Command::Session { token } => auth::session(p, token),
            Command::UpdatePassword {
                token,
                current_password,
                new_password,
            } => auth::update_password(p, token, current_password, new_password),

            // User commands
            Command::CreateUser {
                token,
                name,
                password,
                admin,
            } => user::create_user(p, token, name, password, admin),
            Command::UpdateUser {
                token,
                name,
                admin,
                password,
            } => user::update_user(p, token, name, admin, password),
            Command::DeleteUser { token, name } => user::delete_user(p, token, name),
            Command::ListUsers { token } => user::list_users(p, token),

            // Data commands
            Command::GetAllData { token } => data::get_all_data(p, token),
            Command::GetData { token, key } => data::get_data(p, token, key),
            Command::SetData { token, key, value } => data::set_data(p, token, key, value),
            Command::DeleteData { token, key } => data::delete_data(p, token, key),
        }
    }
}
