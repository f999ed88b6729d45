//! Command enum defining all genesis operations.
//!
//! Commands are the "instruction set" of the backend. Every request a client
//! can make is represented as a variant of this enum.
//!
//! Commands are:
//! - **Self-contained**: All parameters needed for execution are in the variant
//! - **Serializable**: Can be converted to/from JSON for any transport
//! - **Pure data**: No closures or executable code

use serde::{Deserialize, Serialize};

/// A command is a self-contained, serializable operation.
///
/// # Command Categories
///
/// | Category | Count | Description |
/// |----------|-------|-------------|
/// | Database | 1 | Liveness |
/// | Auth | 4 | Login, logout, session lookup, own password |
/// | User | 4 | Account administration (admin only) |
/// | Data | 4 | Per-account JSON documents |
///
/// # Authentication
///
/// Every command except `Ping` and `Login` carries the session `token`
/// returned by `Login`.
///
/// # Example
///
/// ```ignore
/// use genesis_executor::Command;
///
/// let cmd = Command::SetData {
///     token: token.clone(),
///     key: "settings".into(),
///     value: r#"{"theme":"dark"}"#.into(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    // ==================== Database (1) ====================
    /// Liveness check.
    /// Returns: `Output::Pong`
    Ping,

    // ==================== Auth (4) ====================
    /// Exchange credentials for a session token.
    /// Returns: `Output::Login`
    Login { name: String, password: String },

    /// Revoke a session token.
    /// Returns: `Output::Unit`
    Logout { token: String },

    /// Look up the account a token belongs to.
    /// Returns: `Output::Account`
    Session { token: String },

    /// Change the requester's own password.
    /// Returns: `Output::Unit`
    UpdatePassword {
        token: String,
        current_password: String,
        new_password: String,
    },

    // ==================== User (4) ====================
    /// Create an account.
    /// Returns: `Output::Unit`
    CreateUser {
        token: String,
        name: String,
        password: String,
        #[serde(default)]
        admin: bool,
    },

    /// Change another account's admin flag or password.
    /// Returns: `Output::Unit`
    UpdateUser {
        token: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        admin: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },

    /// Delete an account and all of its data.
    /// Returns: `Output::Unit`
    DeleteUser { token: String, name: String },

    /// List every account except the requester.
    /// Returns: `Output::Users`
    ListUsers { token: String },

    // ==================== Data (4) ====================
    /// Fetch every document of the requester as one JSON object.
    /// Returns: `Output::Json`
    GetAllData { token: String },

    /// Fetch one document.
    /// Returns: `Output::Json`
    GetData { token: String, key: String },

    /// Store a JSON document, replacing any previous one.
    /// Returns: `Output::Unit`
    SetData {
        token: String,
        key: String,
        value: String,
    },

    /// Delete a document. Succeeds when the key is absent.
    /// Returns: `Output::Unit`
    DeleteData { token: String, key: String },
}

impl Command {
    /// Variant name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "Ping",
            Command::Login { .. } => "Login",
            Command::Logout { .. } => "Logout",
            Command::Session { .. } => "Session",
            Command::UpdatePassword { .. } => "UpdatePassword",
            Command::CreateUser { .. } => "CreateUser",
            Command::UpdateUser { .. } => "UpdateUser",
            Command::DeleteUser { .. } => "DeleteUser",
            Command::ListUsers { .. } => "ListUsers",
            Command::GetAllData { .. } => "GetAllData",
            Command::GetData { .. } => "GetData",
            Command::SetData { .. } => "SetData",
            Command::DeleteData { .. } => "DeleteData",
        }
    }
}
