//! PBKDF2-HMAC-SHA256 password hasher
//!
//! Digest layout:
//!
//! ```text
//! [version: u8][iterations: u32 BE][salt: 16][derived key: 32]
//! ```
//!
//! The iteration count travels with the digest, so raising
//! `password_iterations` only affects newly hashed passwords.
//!
//! Unknown accounts are checked against a dummy digest. Its iteration
//! count should match what most stored digests use, otherwise a login for
//! a missing name returns measurably faster or slower than a wrong
//! password. See [`Pbkdf2Hasher::with_dummy_iterations`].

use genesis_core::{GenesisError, Result};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::PasswordHasher;

const DIGEST_VERSION: u8 = 1;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

const KEY_LEN: usize = 32;

/// Total digest length in bytes
pub const DIGEST_LEN: usize = 1 + 4 + SALT_LEN + KEY_LEN;

/// Salted, iterated password hasher
#[derive(Debug, Clone)]
pub struct Pbkdf2Hasher {
    iterations: u32,
    dummy: Vec<u8>,
}

impl Pbkdf2Hasher {
    /// Create a hasher using `iterations` rounds for new digests
    ///
    /// The dummy digest uses the same count.
    pub fn new(iterations: u32) -> Result<Self> {
        Self::with_dummy_iterations(iterations, iterations)
    }

    /// Create a hasher whose dummy digest costs `dummy_iterations`
    ///
    /// Use this when the stored digests were mostly hashed under a
    /// different count than the one configured now.
    pub fn with_dummy_iterations(iterations: u32, dummy_iterations: u32) -> Result<Self> {
        if iterations == 0 || dummy_iterations == 0 {
            return Err(GenesisError::invalid_input("iterations must be positive"));
        }
        let mut unguessable = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut unguessable);
        let dummy = digest_with_salt(&unguessable, &random_salt(), dummy_iterations);
        Ok(Self { iterations, dummy })
    }

    /// Iteration count used for new digests
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

/// Iteration count of a well-formed digest
fn parse_iterations(digest: &[u8]) -> Option<u32> {
    if digest.len() != DIGEST_LEN || digest[0] != DIGEST_VERSION {
        return None;
    }
    let iterations = u32::from_be_bytes([digest[1], digest[2], digest[3], digest[4]]);
    (iterations > 0).then_some(iterations)
}

fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn digest_with_salt(password: &[u8], salt: &[u8; SALT_LEN], iterations: u32) -> Vec<u8> {
    let key = derive_key(password, salt, iterations);
    let mut digest = Vec::with_capacity(DIGEST_LEN);
    digest.push(DIGEST_VERSION);
    digest.extend_from_slice(&iterations.to_be_bytes());
    digest.extend_from_slice(salt);
    digest.extend_from_slice(&key);
    digest
}

fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}

impl PasswordHasher for Pbkdf2Hasher {
    fn hash(&self, password: &str) -> Result<Vec<u8>> {
        Ok(digest_with_salt(
            password.as_bytes(),
            &random_salt(),
            self.iterations,
        ))
    }

    fn verify(&self, password: &str, digest: &[u8]) -> bool {
        let Some(iterations) = parse_iterations(digest) else {
            return false;
        };
        let salt = &digest[5..5 + SALT_LEN];
        let expected = &digest[5 + SALT_LEN..];

        let key = derive_key(password.as_bytes(), salt, iterations);
        key[..].ct_eq(expected).into()
    }

    fn digest_cost(&self, digest: &[u8]) -> Option<u32> {
        parse_iterations(digest)
    }

    fn dummy_digest(&self) -> &[u8] {
        &self.dummy
    }
}
