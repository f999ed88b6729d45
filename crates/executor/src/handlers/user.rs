//! Account administration handlers. Every command here needs an admin
//! session.

use std::sync::Arc;

use genesis_primitives::AccountUpdate;
use tracing::{info, warn};

use crate::bridge::{forbidden, validate_name, validate_password, Primitives};
use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle CreateUser command.
pub fn create_user(
    p: &Arc<Primitives>,
    token: String,
    name: String,
    password: String,
    admin: bool,
) -> Result<Output> {
    let requester = p.authenticate_admin(&token)?;
    validate_name(&name)?;
    validate_password(&password)?;
    convert_result(p.registry.create(&name, &password, admin))?;
    info!(by = %requester.name, user = %name, admin, "account created");
    Ok(Output::Unit)
}

/// Handle UpdateUser command.
///
/// Admins change their own password through `UpdatePassword`; this command
/// refuses to touch the requester.
pub fn update_user(
    p: &Arc<Primitives>,
    token: String,
    name: String,
    admin: Option<bool>,
    password: Option<String>,
) -> Result<Output> {
    let requester = p.authenticate_admin(&token)?;
    if requester.name == name {
        return Err(forbidden("admins cannot update themselves"));
    }
    if let Some(password) = &password {
        validate_password(password)?;
    }
    convert_result(p.registry.update(&name, AccountUpdate { admin, password }))?;
    Ok(Output::Unit)
}

/// Handle DeleteUser command.
///
/// Deleting an absent account succeeds. A failed data cascade is logged;
/// the account itself is already gone at that point.
pub fn delete_user(p: &Arc<Primitives>, token: String, name: String) -> Result<Output> {
    let requester = p.authenticate_admin(&token)?;
    let deletion = convert_result(p.registry.delete(&name))?;
    match &deletion.cascade {
        Ok(removed) if deletion.existed => {
            info!(by = %requester.name, user = %name, removed, "account deleted");
        }
        Ok(_) => {}
        Err(e) => warn!(user = %name, error = %e, "account deleted but its data was not"),
    }
    Ok(Output::Unit)
}

/// Handle ListUsers command.
pub fn list_users(p: &Arc<Primitives>, token: String) -> Result<Output> {
    let requester = p.authenticate_admin(&token)?;
    let users = convert_result(p.registry.list(Some(&requester.name)))?;
    Ok(Output::Users(users))
}
