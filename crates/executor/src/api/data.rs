//! Per-account JSON documents.

use super::{unexpected, Genesis};
use crate::{Command, Output, Result};

impl Genesis {
    // =========================================================================
    // Data
    // =========================================================================

    /// All of the requester's documents as one JSON object.
    pub fn get_all_data(&self, token: &str) -> Result<String> {
        match self.executor.execute(Command::GetAllData {
            token: token.to_string(),
        })? {
            Output::Json(text) => Ok(text),
            _ => Err(unexpected("GetAllData")),
        }
    }

    /// One document, as stored (minified).
    pub fn get_data(&self, token: &str, key: &str) -> Result<String> {
        match self.executor.execute(Command::GetData {
            token: token.to_string(),
            key: key.to_string(),
        })? {
            Output::Json(text) => Ok(text),
            _ => Err(unexpected("GetData")),
        }
    }

    /// Store a JSON document under `key`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// app.set_data(&token, "settings", r#"{"theme":"dark"}"#)?;
    /// ```
    pub fn set_data(&self, token: &str, key: &str, value: &str) -> Result<()> {
        match self.executor.execute(Command::SetData {
            token: token.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("SetData")),
        }
    }

    /// Delete a document. Absent keys are not an error.
    pub fn delete_data(&self, token: &str, key: &str) -> Result<()> {
        match self.executor.execute(Command::DeleteData {
            token: token.to_string(),
            key: key.to_string(),
        })? {
            Output::Unit => Ok(()),
            _ => Err(unexpected("DeleteData")),
        }
    }
}
