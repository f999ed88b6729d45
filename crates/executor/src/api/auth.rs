//! Session operations.

use super::{unexpected, Genesis};
use crate::{AccountInfo, Command, Output, Result};

impl Genesis {
    // =========================================================================
    // Sessions
    // =========================================================================

    /// Log in, returning a session token and the account it belongs to.
    ///
    /// Unknown names and wrong passwords are indistinguishable.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let (token, user) = app.login("alice", "wonderland")?;
    /// assert!(!user.admin);
    /// ```
    pub fn login(&self, name: &str, password: &str) -> Result<(String, AccountInfo)> {
        match self.executor.execute(Command::Login {
            name: name.to_string(),
            password: password.to_string(),
        })? {
            Output::Login { token, user } => Ok((token, user)),
            _ => Err(unexpected("Login")),
        }
    }

    /// Revoke a token. Using it afterwards fails `Unauthorized`.
    pub fn logout(&self, token: &str) -> Result<()> {
        match self.executor.execute(Command::Logout {
            token: token.to_string(),
        })? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("Logout")),
        }
    }

    /// The account a token belongs to.
    pub fn session(&self, token: &str) -> Result<AccountInfo> {
        match self.executor.execute(Command::Session {
            token: token.to_string(),
        })? {
            Output::Account(info) => Ok(info),
            _ => Err(unexpected("Session")),
        }
    }

    /// Change the requester's own password.
    pub fn update_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        match self.executor.execute(Command::UpdatePassword {
            token: token.to_string(),
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        })? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("UpdatePassword")),
        }
    }
}
