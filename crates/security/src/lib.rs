//! Password hashing and token signing for genesis.
//!
//! The account and session layers only see the [`PasswordHasher`] and
//! [`TokenSigner`] traits. [`Pbkdf2Hasher`] and [`HmacSigner`] are the
//! implementations wired in by default.

#![warn(missing_docs)]

mod password;
mod signer;

pub use password::{Pbkdf2Hasher, DIGEST_LEN, SALT_LEN};
pub use signer::{HmacSigner, SECRET_LEN};

use genesis_core::Result;

/// One-way password digests
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted digest of `password`
    fn hash(&self, password: &str) -> Result<Vec<u8>>;

    /// Check `password` against a digest produced by [`hash`](Self::hash)
    ///
    /// Malformed digests never verify.
    fn verify(&self, password: &str, digest: &[u8]) -> bool;

    /// Work factor recorded in `digest`, or `None` if it is malformed
    fn digest_cost(&self, digest: &[u8]) -> Option<u32>;

    /// A well-formed digest that no submitted password matches
    ///
    /// Verifying against it costs as much as a real verification, so a
    /// login for an unknown account takes as long as a wrong password, as
    /// long as its cost matches the stored digests.
    fn dummy_digest(&self) -> &[u8];
}

/// Message authentication for session tokens
pub trait TokenSigner: Send + Sync {
    /// Sign `message`
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Check `signature` over `message` in constant time
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool;
}
