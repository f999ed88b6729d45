//! UserRegistry: account records and password authentication
//!
//! One record per account under `Key::new_account(name)`, encoded with
//! MessagePack. Names are unique because creation checks for the key and
//! inserts it in the same serializable transaction.

use std::collections::HashMap;
use std::sync::Arc;

use genesis_core::{GenesisError, Key, Result, TypeTag};
use genesis_engine::Database;
use genesis_security::PasswordHasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::DataStore;
use crate::write_retry;

/// An account as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Unique account name
    pub name: String,
    /// Digest produced by the configured [`PasswordHasher`]
    pub password_digest: Vec<u8>,
    /// Whether the account may administer other accounts
    pub admin: bool,
}

impl Account {
    /// The fields safe to show to clients
    pub fn info(&self) -> AccountInfo {
        AccountInfo {
            name: self.name.clone(),
            admin: self.admin,
        }
    }
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account name
    pub name: String,
    /// Admin flag
    pub admin: bool,
}

/// Fields an update may change; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    /// New admin flag
    pub admin: Option<bool>,
    /// New plain-text password
    pub password: Option<String>,
}

/// Result of deleting an account
///
/// The cascade over the owner's data runs after the account key is gone
/// and may fail on its own; that failure is reported here, not swallowed.
#[derive(Debug)]
pub struct AccountDeletion {
    /// Whether an account record was present
    pub existed: bool,
    /// Data items removed, or why the cascade failed
    pub cascade: std::result::Result<usize, GenesisError>,
}

impl AccountDeletion {
    /// True when the cascade succeeded
    pub fn is_clean(&self) -> bool {
        self.cascade.is_ok()
    }
}

#[derive(Serialize, Deserialize)]
struct AccountRecord {
    password: Vec<u8>,
    admin: bool,
}

fn encode_record(account: &Account) -> Result<Vec<u8>> {
    let record = AccountRecord {
        password: account.password_digest.clone(),
        admin: account.admin,
    };
    rmp_serde::to_vec_named(&record)
        .map_err(|e| GenesisError::internal(format!("failed to encode account: {}", e)))
}

fn decode_record(name: String, bytes: &[u8]) -> Result<Account> {
    let record: AccountRecord = rmp_serde::from_slice(bytes).map_err(|e| {
        GenesisError::corruption(format!("account record '{}' is unreadable: {}", name, e))
    })?;
    Ok(Account {
        name,
        password_digest: record.password,
        admin: record.admin,
    })
}

/// Account registry
///
/// # Example
///
/// ```ignore
/// let registry = UserRegistry::new(db.clone(), hasher);
/// registry.create("alice", "wonderland", false)?;
/// let account = registry.authenticate("alice", "wonderland")?;
/// ```
#[derive(Clone)]
pub struct UserRegistry {
    db: Arc<Database>,
    hasher: Arc<dyn PasswordHasher>,
    data: DataStore,
}

impl UserRegistry {
    /// Create a registry; `data` is the store its cascade deletes clean
    pub fn new(db: Arc<Database>, hasher: Arc<dyn PasswordHasher>, data: DataStore) -> Self {
        Self { db, hasher, data }
    }

    /// Create an account
    ///
    /// Fails with `AlreadyExists` when the name is taken. Of several
    /// concurrent creates for one name exactly one succeeds.
    pub fn create(&self, name: &str, password: &str, admin: bool) -> Result<Account> {
        let account = Account {
            name: name.to_string(),
            password_digest: self.hasher.hash(password)?,
            admin,
        };
        let key = Key::new_account(name);
        let encoded = encode_record(&account)?;

        self.db.transaction_with_retry(write_retry(), |txn| {
            if txn.exists(&key)? {
                return Err(GenesisError::already_exists(format!("account '{}'", name)));
            }
            txn.put(key.clone(), encoded.clone())
        })?;

        debug!(name, admin, "account created");
        Ok(account)
    }

    /// Create the account unless one with this name exists
    ///
    /// Returns true when it was created.
    pub fn ensure(&self, name: &str, password: &str, admin: bool) -> Result<bool> {
        match self.create(name, password, admin) {
            Ok(_) => Ok(true),
            Err(GenesisError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Look up an account
    pub fn get(&self, name: &str) -> Result<Account> {
        match self.db.get(&Key::new_account(name))? {
            Some(stored) => decode_record(name.to_string(), &stored.value),
            None => Err(GenesisError::not_found(format!("account '{}'", name))),
        }
    }

    /// Whether an account exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.db.get(&Key::new_account(name))?.is_some())
    }

    /// Change the supplied fields of an account
    pub fn update(&self, name: &str, update: AccountUpdate) -> Result<Account> {
        let new_digest = match &update.password {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };
        let key = Key::new_account(name);

        self.db.transaction_with_retry(write_retry(), |txn| {
            let bytes = txn
                .get(&key)?
                .ok_or_else(|| GenesisError::not_found(format!("account '{}'", name)))?;
            let mut account = decode_record(name.to_string(), &bytes)?;
            if let Some(admin) = update.admin {
                account.admin = admin;
            }
            if let Some(digest) = &new_digest {
                account.password_digest = digest.clone();
            }
            txn.put(key.clone(), encode_record(&account)?)?;
            Ok(account)
        })
    }

    /// Delete an account and every data item it owns
    ///
    /// Deleting an absent account succeeds. Only a failure to remove the
    /// account key itself is an error; the cascade outcome is reported in
    /// the returned [`AccountDeletion`].
    pub fn delete(&self, name: &str) -> Result<AccountDeletion> {
        let key = Key::new_account(name);
        let existed = self.db.transaction_with_retry(write_retry(), |txn| {
            let existed = txn.exists(&key)?;
            if existed {
                txn.delete(key.clone())?;
            }
            Ok(existed)
        })?;

        let cascade = self.data.delete_all(name);
        debug!(name, existed, "account deleted");
        Ok(AccountDeletion { existed, cascade })
    }

    /// All accounts in key order, optionally omitting one name
    pub fn list(&self, excluding: Option<&str>) -> Result<Vec<AccountInfo>> {
        let mut accounts = Vec::new();
        for (key, stored) in self.db.scan_prefix(&Key::new_account_prefix())? {
            let name = key.decode_owner(TypeTag::Account)?;
            if excluding == Some(name.as_str()) {
                continue;
            }
            accounts.push(decode_record(name, &stored.value)?.info());
        }
        Ok(accounts)
    }

    /// The digest cost most stored accounts use
    ///
    /// Ties go to the higher cost. `None` when no account has a digest the
    /// hasher can read.
    pub fn dominant_digest_cost(&self) -> Result<Option<u32>> {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        for (key, stored) in self.db.scan_prefix(&Key::new_account_prefix())? {
            let name = key.decode_owner(TypeTag::Account)?;
            let account = decode_record(name, &stored.value)?;
            if let Some(cost) = self.hasher.digest_cost(&account.password_digest) {
                *counts.entry(cost).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .max_by_key(|&(cost, n)| (n, cost))
            .map(|(cost, _)| cost))
    }

    /// Cost of the digest unknown names are checked against
    pub fn dummy_cost(&self) -> Option<u32> {
        self.hasher.digest_cost(self.hasher.dummy_digest())
    }

    /// Check credentials
    ///
    /// An unknown name and a wrong password fail identically with
    /// `InvalidCredentials`; unknown names still pay for one verification.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<Account> {
        let account = match self.get(name) {
            Ok(account) => Some(account),
            Err(GenesisError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let digest = match &account {
            Some(account) => account.password_digest.as_slice(),
            None => self.hasher.dummy_digest(),
        };
        let verified = self.hasher.verify(password, digest);

        match account {
            Some(account) if verified => Ok(account),
            _ => Err(GenesisError::InvalidCredentials),
        }
    }
}
