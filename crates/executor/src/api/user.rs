//! Account administration. All of these need an admin token.

use super::{unexpected, Genesis};
use crate::{AccountInfo, Command, Output, Result};

impl Genesis {
    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an account.
    pub fn create_user(&self, token: &str, name: &str, password: &str, admin: bool) -> Result<()> {
        match self.executor.execute(Command::CreateUser {
            token: token.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            admin,
        })? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("CreateUser")),
        }
    }

    /// Change another account's admin flag and/or password.
    pub fn update_user(
        &self,
        token: &str,
        name: &str,
        admin: Option<bool>,
        password: Option<&str>,
    ) -> Result<()> {
        match self.executor.execute(Command::UpdateUser {
            token: token.to_string(),
            name: name.to_string(),
            admin,
            password: password.map(str::to_string),
        })? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("UpdateUser")),
        }
    }

    /// Delete an account together with its data.
    pub fn delete_user(&self, token: &str, name: &str) -> Result<()> {
        match self.executor.execute(Command::DeleteUser {
            token: token.to_string(),
            name: name.to_string(),
        })? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("DeleteUser")),
        }
    }

    /// Every account except the requester.
    pub fn list_users(&self, token: &str) -> Result<Vec<AccountInfo>> {
        match self.executor.execute(Command::ListUsers {
            token: token.to_string(),
        })? {
            Output::Users(users) => Ok(users),
            _ => Err(unexpected("ListUsers")),
        }
    }
}
