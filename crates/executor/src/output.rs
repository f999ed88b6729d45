//! Output enum for command execution results.
//!
//! Every command produces exactly one output type. This mapping is
//! deterministic: the same command always produces the same output variant
//! (though the values may differ based on database state).

use genesis_primitives::AccountInfo;
use serde::{Deserialize, Serialize};

/// Successful command execution results.
///
/// Each [`Command`](crate::Command) variant maps to exactly one `Output`
/// variant, documented on the command.
///
/// # Example
///
/// ```text
/// let result = executor.execute(Command::GetData { token, key })?;
///
/// match result {
///     Output::Json(text) => println!("{}", text),
///     _ => unreachable!("GetData always returns Json"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Output {
    /// No return value
    Unit,

    /// Ping response
    Pong {
        /// Crate version
        version: String,
    },

    /// Successful login
    Login {
        /// Signed session token
        token: String,
        /// The account that logged in
        user: AccountInfo,
    },

    /// A single account
    Account(AccountInfo),

    /// Account listing
    Users(Vec<AccountInfo>),

    /// Minified JSON text
    Json(String),
}
