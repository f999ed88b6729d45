//! Key namespace encoding
//!
//! Every entity lives in one flat, ordered key space. A [`Key`] is the
//! encoded byte string; [`TypeTag`] discriminates the entity kind.
//!
//! Layout (lengths are big-endian u32):
//!
//! ```text
//! [tag][owner_len][owner]                     account / revoked token
//! [tag][owner_len][owner][key_len][key]       data item
//! ```
//!
//! Because each variable-length component carries its length, the data
//! prefix of one owner can never be a prefix of another owner's keys, and
//! keys of different kinds never interleave.

use std::fmt;
use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{GenesisError, Result};

/// Entity kind discriminator, the first byte of every key
///
/// Ordering: Account < Data < Revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeTag {
    /// Account record, owner = account name
    Account = 0x01,
    /// Per-owner data item
    Data = 0x02,
    /// Revoked session marker, owner = token id
    Revoked = 0x03,
}

impl TypeTag {
    /// Convert to byte representation
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Try to create from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(TypeTag::Account),
            0x02 => Some(TypeTag::Data),
            0x03 => Some(TypeTag::Revoked),
            _ => None,
        }
    }
}

/// Encoded storage key
///
/// Ordering is plain byte order of the encoding, which groups keys by kind,
/// then by owner, then by data key.
///
/// # Examples
///
/// ```
/// use genesis_core::Key;
///
/// let prefix = Key::new_data_prefix("alice");
/// let key = Key::new_data("alice", "settings");
/// assert!(key.starts_with(&prefix));
/// assert!(!Key::new_data("alice2", "settings").starts_with(&prefix));
///
/// let (owner, name) = key.decode_data().unwrap();
/// assert_eq!((owner.as_str(), name.as_str()), ("alice", "settings"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(Vec<u8>);

impl Key {
    /// Encode `(tag, owner, key?)` into one flat key
    pub fn encode(tag: TypeTag, owner: &str, key: Option<&str>) -> Self {
        let extra = key.map(|k| 4 + k.len()).unwrap_or(0);
        let mut buf = Vec::with_capacity(1 + 4 + owner.len() + extra);
        buf.push(tag.as_byte());
        write_component(&mut buf, owner.as_bytes());
        if let Some(k) = key {
            write_component(&mut buf, k.as_bytes());
        }
        Key(buf)
    }

    /// Key of the account named `name`
    pub fn new_account(name: &str) -> Self {
        Self::encode(TypeTag::Account, name, None)
    }

    /// Prefix covering every account key
    pub fn new_account_prefix() -> Self {
        Key(vec![TypeTag::Account.as_byte()])
    }

    /// Key of data item `key` owned by `owner`
    pub fn new_data(owner: &str, key: &str) -> Self {
        Self::encode(TypeTag::Data, owner, Some(key))
    }

    /// Prefix covering every data item of `owner` and nothing else
    pub fn new_data_prefix(owner: &str) -> Self {
        Self::encode(TypeTag::Data, owner, None)
    }

    /// Key of the revocation marker for token `id`
    pub fn new_revoked(id: &str) -> Self {
        Self::encode(TypeTag::Revoked, id, None)
    }

    /// Wrap already-encoded bytes (used by log replay)
    pub fn from_encoded(bytes: Vec<u8>) -> Self {
        Key(bytes)
    }

    /// Raw encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Kind of this key, if the tag byte is known
    pub fn type_tag(&self) -> Option<TypeTag> {
        self.0.first().copied().and_then(TypeTag::from_byte)
    }

    /// Check if this key starts with the given prefix
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Decode a data key into `(owner, key)`
    ///
    /// # Errors
    ///
    /// `Corruption` on a wrong tag, truncated component, trailing bytes or
    /// non-UTF-8 content.
    pub fn decode_data(&self) -> Result<(String, String)> {
        let mut cursor = self.open(TypeTag::Data)?;
        let owner = read_component(&mut cursor)?;
        let key = read_component(&mut cursor)?;
        finish(&cursor)?;
        Ok((owner, key))
    }

    /// Decode an account or revoked-token key into its owner component
    pub fn decode_owner(&self, expected: TypeTag) -> Result<String> {
        if expected == TypeTag::Data {
            return Err(GenesisError::invalid_input(
                "data keys carry two components, use decode_data",
            ));
        }
        let mut cursor = self.open(expected)?;
        let owner = read_component(&mut cursor)?;
        finish(&cursor)?;
        Ok(owner)
    }

    fn open(&self, expected: TypeTag) -> Result<Cursor<&[u8]>> {
        let mut cursor = Cursor::new(self.0.as_slice());
        let tag = cursor
            .read_u8()
            .map_err(|_| GenesisError::corruption("empty key"))?;
        if tag != expected.as_byte() {
            return Err(GenesisError::corruption(format!(
                "expected tag {:#04x}, found {:#04x}",
                expected.as_byte(),
                tag
            )));
        }
        Ok(cursor)
    }
}

fn write_component(buf: &mut Vec<u8>, bytes: &[u8]) {
    // Writing into a Vec cannot fail.
    let _ = buf.write_u32::<BigEndian>(bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

fn read_component(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = cursor
        .read_u32::<BigEndian>()
        .map_err(|_| GenesisError::corruption("truncated length prefix"))? as usize;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if len > remaining {
        return Err(GenesisError::corruption(format!(
            "component length {} exceeds remaining {} bytes",
            len, remaining
        )));
    }
    let mut bytes = vec![0u8; len];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| GenesisError::corruption("truncated component"))?;
    String::from_utf8(bytes).map_err(|_| GenesisError::corruption("component is not utf-8"))
}

fn finish(cursor: &Cursor<&[u8]>) -> Result<()> {
    if (cursor.position() as usize) != cursor.get_ref().len() {
        return Err(GenesisError::corruption("trailing bytes after key"));
    }
    Ok(())
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_tag() {
            Some(TypeTag::Data) => match self.decode_data() {
                Ok((owner, key)) => write!(f, "data/{}/{}", owner, key),
                Err(_) => write!(f, "data/<malformed>"),
            },
            Some(tag) => match self.decode_owner(tag) {
                Ok(owner) => write!(f, "{:?}/{}", tag, owner),
                Err(_) => write!(f, "{:?}/<prefix>", tag),
            },
            None => write!(f, "<{} raw bytes>", self.0.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_type_tag_byte_roundtrip() {
        for tag in [TypeTag::Account, TypeTag::Data, TypeTag::Revoked] {
            assert_eq!(TypeTag::from_byte(tag.as_byte()), Some(tag));
        }
        assert_eq!(TypeTag::from_byte(0x00), None);
        assert_eq!(TypeTag::from_byte(0x04), None);
    }

    #[test]
    fn test_account_layout() {
        let key = Key::new_account("bob");
        assert_eq!(key.as_bytes(), &[0x01, 0, 0, 0, 3, b'b', b'o', b'b']);
        assert_eq!(key.decode_owner(TypeTag::Account).unwrap(), "bob");
    }

    #[test]
    fn test_data_layout() {
        let key = Key::new_data("al", "k");
        assert_eq!(
            key.as_bytes(),
            &[0x02, 0, 0, 0, 2, b'a', b'l', 0, 0, 0, 1, b'k']
        );
    }

    #[test]
    fn test_prefix_isolates_owners() {
        let alice = Key::new_data_prefix("alice");
        assert!(Key::new_data("alice", "x").starts_with(&alice));
        assert!(!Key::new_data("alicex", "y").starts_with(&alice));
        assert!(!Key::new_data("alic", "ex").starts_with(&alice));
        assert!(!Key::new_account("alice").starts_with(&alice));
    }

    #[test]
    fn test_kinds_do_not_interleave() {
        let account = Key::new_account("zzz");
        let data = Key::new_data("aaa", "aaa");
        let revoked = Key::new_revoked("000");
        assert!(account < data);
        assert!(data < revoked);
        assert!(account.starts_with(&Key::new_account_prefix()));
        assert!(!data.starts_with(&Key::new_account_prefix()));
    }

    #[test]
    fn test_decode_wrong_tag_fails() {
        let err = Key::new_account("bob").decode_data().unwrap_err();
        assert!(matches!(err, GenesisError::Corruption(_)));
        let err = Key::new_data("bob", "k")
            .decode_owner(TypeTag::Revoked)
            .unwrap_err();
        assert!(matches!(err, GenesisError::Corruption(_)));
    }

    #[test]
    fn test_decode_truncated_fails() {
        let full = Key::new_data("owner", "key");
        for cut in 0..full.as_bytes().len() {
            let truncated = Key::from_encoded(full.as_bytes()[..cut].to_vec());
            assert!(
                matches!(truncated.decode_data(), Err(GenesisError::Corruption(_))),
                "cut at {} should fail",
                cut
            );
        }
    }

    #[test]
    fn test_decode_trailing_bytes_fails() {
        let mut bytes = Key::new_data("o", "k").as_bytes().to_vec();
        bytes.push(0xff);
        let err = Key::from_encoded(bytes).decode_data().unwrap_err();
        assert!(matches!(err, GenesisError::Corruption(_)));
    }

    #[test]
    fn test_decode_non_utf8_fails() {
        let bytes = vec![0x01, 0, 0, 0, 2, 0xc3, 0x28];
        let err = Key::from_encoded(bytes)
            .decode_owner(TypeTag::Account)
            .unwrap_err();
        assert!(matches!(err, GenesisError::Corruption(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::new_data("a", "b").to_string(), "data/a/b");
        assert_eq!(Key::new_account("a").to_string(), "Account/a");
    }

    proptest! {
        #[test]
        fn prop_data_key_roundtrip(owner in ".{0,40}", key in ".{0,40}") {
            let encoded = Key::new_data(&owner, &key);
            let (o, k) = encoded.decode_data().unwrap();
            prop_assert_eq!(o, owner);
            prop_assert_eq!(k, key);
        }

        #[test]
        fn prop_distinct_pairs_never_collide(
            a in ("[a-z]{0,6}", "[a-z]{0,6}"),
            b in ("[a-z]{0,6}", "[a-z]{0,6}"),
        ) {
            let ka = Key::new_data(&a.0, &a.1);
            let kb = Key::new_data(&b.0, &b.1);
            prop_assert_eq!(ka == kb, a == b);
        }

        #[test]
        fn prop_owner_prefix_matches_only_owner(
            owner in "[a-z]{1,8}",
            other in "[a-z]{1,8}",
            key in "[a-z]{0,8}",
        ) {
            let prefix = Key::new_data_prefix(&owner);
            let foreign = Key::new_data(&other, &key);
            prop_assert_eq!(foreign.starts_with(&prefix), owner == other);
        }
    }
}
