//! Bridge module: direct access to the genesis primitives.
//!
//! This module provides:
//!
//! - [`Primitives`]: the database plus the registry, data store and session
//!   service built from its configuration
//! - Authorization helpers turning a session token into an account
//! - Validation helpers: account names, passwords, data keys, JSON bodies

use std::sync::Arc;

use genesis_core::{GenesisError, Result as CoreResult};
use genesis_engine::Database;
use genesis_primitives::{Account, DataStore, SessionService, UserRegistry};
use genesis_security::{HmacSigner, Pbkdf2Hasher};
use serde::de::IgnoredAny;
use tracing::info;

use crate::{Error, Result};

// =============================================================================
// Primitives
// =============================================================================

/// Everything a handler needs, wired from one database's configuration.
#[derive(Clone)]
pub struct Primitives {
    /// The underlying database
    pub db: Arc<Database>,
    /// Accounts
    pub registry: UserRegistry,
    /// Per-account documents
    pub data: DataStore,
    /// Session tokens
    pub sessions: SessionService,
}

impl Primitives {
    /// Build the primitives from `db.config()`.
    ///
    /// Without a configured `token_secret` a random secret is drawn, so
    /// tokens issued by this instance die with it.
    pub fn new(db: Arc<Database>) -> CoreResult<Self> {
        let config = db.config();
        let iterations = config.password_iterations;
        let signer = match config.token_secret_bytes()? {
            Some(secret) => HmacSigner::new(secret),
            None => HmacSigner::random(),
        };

        let data = DataStore::new(db.clone(), db.limits());
        let hasher = Arc::new(Pbkdf2Hasher::new(iterations)?);
        let mut registry = UserRegistry::new(db.clone(), hasher, data.clone());

        // Unknown-name logins must cost what most real accounts cost.
        if let Some(stored) = registry.dominant_digest_cost()? {
            if stored != iterations {
                info!(stored, configured = iterations, "dummy digest follows stored cost");
                let hasher = Arc::new(Pbkdf2Hasher::with_dummy_iterations(iterations, stored)?);
                registry = UserRegistry::new(db.clone(), hasher, data.clone());
            }
        }
        let sessions = SessionService::new(db.clone(), Arc::new(signer), config.session_ttl());

        Ok(Self {
            db,
            registry,
            data,
            sessions,
        })
    }

    /// Resolve a token to a live account.
    ///
    /// Any token or account failure becomes `Unauthorized`; storage failures
    /// stay `Internal`.
    pub fn authenticate(&self, token: &str) -> Result<Account> {
        let claims = self.sessions.parse(token).map_err(unauthorized)?;
        self.registry.get(&claims.user).map_err(unauthorized)
    }

    /// Resolve a token to a live admin account, else `Forbidden`.
    pub fn authenticate_admin(&self, token: &str) -> Result<Account> {
        let account = self.authenticate(token).map_err(|e| match e {
            Error::Unauthorized => forbidden("admin session required"),
            other => other,
        })?;
        if !account.admin {
            return Err(forbidden("admin session required"));
        }
        Ok(account)
    }
}

fn unauthorized(err: GenesisError) -> Error {
    match err {
        GenesisError::InvalidToken(_)
        | GenesisError::Expired
        | GenesisError::Revoked
        | GenesisError::NotFound(_) => Error::Unauthorized,
        other => Error::from(other),
    }
}

pub(crate) fn forbidden(reason: &str) -> Error {
    Error::Forbidden {
        reason: reason.to_string(),
    }
}

// =============================================================================
// Validation
// =============================================================================

const NAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=64;
const DATA_KEY_LEN: std::ops::RangeInclusive<usize> = 1..=64;

fn invalid(reason: String) -> Error {
    Error::InvalidInput { reason }
}

/// Account names: 3 to 32 of `[A-Za-z0-9_-]`
pub fn validate_name(name: &str) -> Result<()> {
    if !NAME_LEN.contains(&name.len()) {
        return Err(invalid(format!(
            "name must be {} to {} characters",
            NAME_LEN.start(),
            NAME_LEN.end()
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(invalid(format!(
            "name '{}' may only contain letters, digits, '_' and '-'",
            name
        )));
    }
    Ok(())
}

/// Passwords: 8 to 64 characters
pub fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if !PASSWORD_LEN.contains(&len) {
        return Err(invalid(format!(
            "password must be {} to {} characters",
            PASSWORD_LEN.start(),
            PASSWORD_LEN.end()
        )));
    }
    Ok(())
}

/// Data keys: 1 to 64 of `[A-Za-z0-9_.-]`
pub fn validate_data_key(key: &str) -> Result<()> {
    if !DATA_KEY_LEN.contains(&key.len())
        || !key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
    {
        return Err(invalid(format!(
            "key must match [A-Za-z0-9_.-]{{{},{}}}",
            DATA_KEY_LEN.start(),
            DATA_KEY_LEN.end()
        )));
    }
    Ok(())
}

/// Validate a JSON body and drop the whitespace between its tokens.
///
/// Member order and number spelling are kept exactly as sent.
pub fn minify_json(body: &str) -> Result<String> {
    serde_json::from_str::<IgnoredAny>(body)
        .map_err(|e| invalid(format!("body is not valid JSON: {}", e)))?;

    let mut out = String::with_capacity(body.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in body.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if !matches!(c, ' ' | '\t' | '\n' | '\r') {
            out.push(c);
        }
    }
    Ok(out)
}
