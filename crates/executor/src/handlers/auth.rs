//! Session command handlers: login, logout, session lookup, own password.

use std::sync::Arc;

use genesis_primitives::AccountUpdate;
use tracing::debug;

use crate::bridge::{validate_password, Primitives};
use crate::convert::convert_result;
use crate::{Output, Result};

/// Handle Login command.
///
/// Unknown names and wrong passwords both fail `InvalidCredentials`.
pub fn login(p: &Arc<Primitives>, name: String, password: String) -> Result<Output> {
    let account = convert_result(p.registry.authenticate(&name, &password))?;
    let token = convert_result(p.sessions.issue(&account))?;
    debug!(user = %account.name, "login");
    Ok(Output::Login {
        token,
        user: account.info(),
    })
}

/// Handle Logout command.
///
/// Token failures surface as they are: `InvalidToken`, `Expired`, `Revoked`.
pub fn logout(p: &Arc<Primitives>, token: String) -> Result<Output> {
    let claims = convert_result(p.sessions.parse(&token))?;
    convert_result(p.sessions.revoke(&claims))?;
    Ok(Output::Unit)
}

/// Handle Session command.
pub fn session(p: &Arc<Primitives>, token: String) -> Result<Output> {
    let account = p.authenticate(&token)?;
    Ok(Output::Account(account.info()))
}

/// Handle UpdatePassword command.
pub fn update_password(
    p: &Arc<Primitives>,
    token: String,
    current_password: String,
    new_password: String,
) -> Result<Output> {
    let account = p.authenticate(&token)?;
    convert_result(p.registry.authenticate(&account.name, &current_password))?;
    validate_password(&new_password)?;
    convert_result(p.registry.update(
        &account.name,
        AccountUpdate {
            admin: None,
            password: Some(new_password),
        },
    ))?;
    Ok(Output::Unit)
}
