//! Database configuration via `genesis.toml`
//!
//! On first open a default `genesis.toml` is created in the data directory.
//! To change settings, edit the file and restart.

use std::path::Path;
use std::time::Duration;

use genesis_core::{GenesisError, Limits, Result};
use genesis_durability::DurabilityMode;
use serde::{Deserialize, Serialize};

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "genesis.toml";

/// Account created at open when it does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BootstrapUser {
    /// Account name
    pub name: String,
    /// Plain-text password, hashed before it is stored
    pub password: String,
    /// Whether the account may administer other accounts
    #[serde(default)]
    pub admin: bool,
}

/// Database configuration loaded from `genesis.toml`.
///
/// # Example
///
/// ```toml
/// durability = "standard"
/// session_ttl_secs = 3600
/// keys_per_user = 100
/// max_data_kib = 1024
///
/// [[users]]
/// name = "admin"
/// password = "change-me-please"
/// admin = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Durability mode: `"standard"` or `"always"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
    /// Lifetime of issued session tokens in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Maximum number of data keys one account may hold.
    #[serde(default = "default_keys_per_user")]
    pub keys_per_user: usize,
    /// Maximum size of one stored value in KiB.
    #[serde(default = "default_max_data_kib")]
    pub max_data_kib: usize,
    /// PBKDF2 iteration count for new password digests.
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,
    /// How often expired entries are physically removed.
    #[serde(default = "default_ttl_cleanup_interval_ms")]
    pub ttl_cleanup_interval_ms: u64,
    /// Log size in KiB that triggers compaction into a checkpoint.
    #[serde(default = "default_wal_compact_kib")]
    pub wal_compact_kib: u64,
    /// Hex-encoded token signing secret. A random per-process secret is
    /// used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
    /// Accounts ensured at open.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<BootstrapUser>,
}

fn default_durability_str() -> String {
    "standard".to_string()
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_keys_per_user() -> usize {
    100
}

fn default_max_data_kib() -> usize {
    1024
}

fn default_password_iterations() -> u32 {
    100_000
}

fn default_ttl_cleanup_interval_ms() -> u64 {
    60_000
}

fn default_wal_compact_kib() -> u64 {
    16 * 1024
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            durability: default_durability_str(),
            session_ttl_secs: default_session_ttl_secs(),
            keys_per_user: default_keys_per_user(),
            max_data_kib: default_max_data_kib(),
            password_iterations: default_password_iterations(),
            ttl_cleanup_interval_ms: default_ttl_cleanup_interval_ms(),
            wal_compact_kib: default_wal_compact_kib(),
            token_secret: None,
            users: Vec::new(),
        }
    }
}

impl GenesisConfig {
    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"standard"` or `"always"`.
    pub fn durability_mode(&self) -> Result<DurabilityMode> {
        match self.durability.as_str() {
            "standard" => Ok(DurabilityMode::standard_default()),
            "always" => Ok(DurabilityMode::Always),
            other => Err(GenesisError::invalid_input(format!(
                "Invalid durability mode '{}' in genesis.toml. Expected \"standard\" or \"always\".",
                other
            ))),
        }
    }

    /// Quota and size limits for the data store.
    pub fn limits(&self) -> Limits {
        Limits {
            keys_per_user: self.keys_per_user,
            max_data_bytes: self.max_data_kib.saturating_mul(1024),
        }
    }

    /// Session token lifetime.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Interval of the background TTL cleaner.
    pub fn ttl_cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.ttl_cleanup_interval_ms)
    }

    /// Log size that triggers compaction.
    pub fn wal_compact_bytes(&self) -> u64 {
        self.wal_compact_kib.saturating_mul(1024)
    }

    /// Decoded token secret, if one is configured.
    pub fn token_secret_bytes(&self) -> Result<Option<Vec<u8>>> {
        match &self.token_secret {
            None => Ok(None),
            Some(encoded) => {
                let bytes = hex::decode(encoded.trim()).map_err(|e| {
                    GenesisError::invalid_input(format!("token_secret is not valid hex: {}", e))
                })?;
                if bytes.len() < 16 {
                    return Err(GenesisError::invalid_input(
                        "token_secret must be at least 16 bytes",
                    ));
                }
                Ok(Some(bytes))
            }
        }
    }

    /// Check every field that can be malformed.
    pub fn validate(&self) -> Result<()> {
        self.durability_mode()?;
        self.token_secret_bytes()?;
        if self.session_ttl_secs == 0 {
            return Err(GenesisError::invalid_input("session_ttl_secs must be positive"));
        }
        if self.keys_per_user == 0 {
            return Err(GenesisError::invalid_input("keys_per_user must be positive"));
        }
        if self.max_data_kib == 0 {
            return Err(GenesisError::invalid_input("max_data_kib must be positive"));
        }
        if self.password_iterations == 0 {
            return Err(GenesisError::invalid_input(
                "password_iterations must be positive",
            ));
        }
        if self.wal_compact_kib == 0 {
            return Err(GenesisError::invalid_input("wal_compact_kib must be positive"));
        }
        if self.ttl_cleanup_interval_ms == 0 {
            return Err(GenesisError::invalid_input(
                "ttl_cleanup_interval_ms must be positive",
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Genesis configuration
#
# Durability mode: "standard" (default) or "always"
#   "standard" = periodic fsync (~100ms), may lose last interval on crash
#   "always"   = fsync every commit, zero data loss
durability = "standard"

# Lifetime of session tokens in seconds
session_ttl_secs = 3600

# Maximum number of data keys per account
keys_per_user = 100

# Maximum size of one stored value in KiB
max_data_kib = 1024

# PBKDF2 iterations for password digests
password_iterations = 100000

# How often expired revocation markers are removed, in milliseconds
ttl_cleanup_interval_ms = 60000

# Log size in KiB at which wal.log is rewritten as a checkpoint of live data
wal_compact_kib = 16384

# Hex-encoded signing secret. Without it a random secret is generated on
# every start and sessions do not survive a restart.
# token_secret = "..."

# Accounts created on open when missing
# [[users]]
# name = "admin"
# password = "change-me-please"
# admin = true
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GenesisError::storage(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: GenesisConfig = toml::from_str(&content).map_err(|e| {
            GenesisError::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                GenesisError::storage(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    ///
    /// The token secret and bootstrap passwords are included, so callers
    /// decide whether persisting them is acceptable.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GenesisError::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            GenesisError::storage(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
