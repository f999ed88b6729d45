//! HMAC-SHA256 token signer

use std::fmt;

use genesis_core::{GenesisError, Result};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::TokenSigner;

type HmacSha256 = Hmac<Sha256>;

/// Length of a generated secret
pub const SECRET_LEN: usize = 32;

/// Signs tokens with HMAC-SHA256 under a process-held secret
#[derive(Clone)]
pub struct HmacSigner {
    secret: Vec<u8>,
}

impl HmacSigner {
    /// Create a signer from an explicit secret
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Create a signer with a fresh random secret
    ///
    /// Tokens signed by it stop verifying once the process exits.
    pub fn random() -> Self {
        let mut secret = vec![0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| GenesisError::crypto(format!("hmac key rejected: {}", e)))
    }
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl TokenSigner for HmacSigner {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let mut mac = self.mac()?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let mut mac = match self.mac() {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(message);
        mac.verify_slice(signature).is_ok()
    }
}
