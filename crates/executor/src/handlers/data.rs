//! Data command handlers, scoped to the requester's own documents.

use std::sync::Arc;

use crate::bridge::{minify_json, validate_data_key, Primitives};
use crate::convert::convert_result;
use crate::{Error, Output, Result};

fn into_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::Internal {
        reason: format!("stored document is not UTF-8: {}", e),
    })
}

/// Handle GetAllData command.
pub fn get_all_data(p: &Arc<Primitives>, token: String) -> Result<Output> {
    let account = p.authenticate(&token)?;
    let all = convert_result(p.data.get_all(&account.name))?;
    Ok(Output::Json(into_text(all)?))
}

/// Handle GetData command.
pub fn get_data(p: &Arc<Primitives>, token: String, key: String) -> Result<Output> {
    let account = p.authenticate(&token)?;
    validate_data_key(&key)?;
    let value = convert_result(p.data.get(&account.name, &key))?;
    Ok(Output::Json(into_text(value)?))
}

/// Handle SetData command.
///
/// The size limit applies to the body as sent; the stored document is its
/// minified form.
pub fn set_data(p: &Arc<Primitives>, token: String, key: String, value: String) -> Result<Output> {
    let account = p.authenticate(&token)?;
    validate_data_key(&key)?;
    convert_result(p.data.limits().validate_data_size(value.len()))?;
    let minified = minify_json(&value)?;
    convert_result(
        p.data
            .set_within_quota(&account.name, &key, minified.as_bytes()),
    )?;
    Ok(Output::Unit)
}

/// Handle DeleteData command. Absent keys are not an error.
pub fn delete_data(p: &Arc<Primitives>, token: String, key: String) -> Result<Output> {
    let account = p.authenticate(&token)?;
    convert_result(p.data.delete(&account.name, &key))?;
    Ok(Output::Unit)
}
