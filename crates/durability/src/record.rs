//! WAL record format.
//!
//! # Record Layout
//!
//! ```text
//! ┌─────────────────┬──────────────────┬─────────────────────────┬──────────┐
//! │ Length (4 bytes)│ Format Ver (1)   │ Payload (variable)      │ CRC32 (4)│
//! └─────────────────┴──────────────────┴─────────────────────────┴──────────┘
//! ```
//!
//! Length covers format version, payload and CRC. The CRC covers format
//! version and payload. All integers are little-endian. The payload is the
//! MessagePack encoding of [`WalRecord`].

use crc32fast::Hasher;
use genesis_core::{Key, Timestamp};
use serde::{Deserialize, Serialize};

/// Current WAL record format version
pub const WAL_RECORD_FORMAT_VERSION: u8 = 1;

/// One write inside a committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalWrite {
    /// Encoded key
    pub key: Key,
    /// Value bytes
    pub value: Vec<u8>,
    /// Absolute expiry, if the write carried a TTL
    pub expires_at: Option<Timestamp>,
}

/// One committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalRecord {
    /// Commit version shared by every write and delete in the record
    pub version: u64,
    /// Commit time
    pub timestamp: Timestamp,
    /// Writes in commit order
    pub writes: Vec<WalWrite>,
    /// Deleted keys
    pub deletes: Vec<Key>,
}

impl WalRecord {
    /// Create a new WAL record stamped with the current time.
    pub fn new(version: u64, writes: Vec<WalWrite>, deletes: Vec<Key>) -> Self {
        WalRecord {
            version,
            timestamp: Timestamp::now(),
            writes,
            deletes,
        }
    }

    /// Serialize record to framed bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WalRecordError> {
        let body = rmp_serde::to_vec(self).map_err(|e| WalRecordError::Encode(e.to_string()))?;

        let mut payload = Vec::with_capacity(1 + body.len());
        payload.push(WAL_RECORD_FORMAT_VERSION);
        payload.extend_from_slice(&body);

        let crc = compute_crc(&payload);

        let total_len = payload.len() + 4;
        let mut record = Vec::with_capacity(4 + total_len);
        record.extend_from_slice(&(total_len as u32).to_le_bytes());
        record.extend_from_slice(&payload);
        record.extend_from_slice(&crc.to_le_bytes());

        Ok(record)
    }

    /// Deserialize one record from the front of `bytes`.
    ///
    /// Returns (record, bytes_consumed) on success.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), WalRecordError> {
        let length = match bytes.get(0..4) {
            Some(b) => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize,
            None => return Err(WalRecordError::InsufficientData),
        };

        // Minimum: 1 byte format version + 4 bytes CRC
        if length < 5 {
            return Err(WalRecordError::InvalidFormat);
        }
        if bytes.len() < 4 + length {
            return Err(WalRecordError::InsufficientData);
        }

        let framed = &bytes[4..4 + length];
        let (payload, crc_bytes) = framed.split_at(length - 4);
        let stored_crc = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);

        let computed_crc = compute_crc(payload);
        if computed_crc != stored_crc {
            return Err(WalRecordError::ChecksumMismatch {
                expected: stored_crc,
                computed: computed_crc,
            });
        }

        let format_version = payload[0];
        if format_version != WAL_RECORD_FORMAT_VERSION {
            return Err(WalRecordError::UnsupportedVersion(format_version));
        }

        let record: WalRecord = rmp_serde::from_slice(&payload[1..])
            .map_err(|e| WalRecordError::Decode(e.to_string()))?;

        Ok((record, 4 + length))
    }
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// WAL record parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalRecordError {
    /// Not enough data to parse record
    #[error("insufficient data to parse record")]
    InsufficientData,

    /// Record format is invalid
    #[error("invalid record format")]
    InvalidFormat,

    /// Checksum verification failed
    #[error("checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Expected checksum from record
        expected: u32,
        /// Computed checksum
        computed: u32,
    },

    /// Unsupported format version
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),

    /// Payload could not be encoded
    #[error("record encode failed: {0}")]
    Encode(String),

    /// Payload passed the checksum but did not decode
    #[error("record decode failed: {0}")]
    Decode(String),
}

impl From<WalRecordError> for genesis_core::GenesisError {
    fn from(e: WalRecordError) -> Self {
        match e {
            WalRecordError::Encode(msg) => genesis_core::GenesisError::storage(msg),
            other => genesis_core::GenesisError::corruption(other.to_string()),
        }
    }
}
