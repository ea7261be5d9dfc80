//! Payload header types and constants.

use crate::error::{DecodeError, EncodeError};
use crate::hash::payload_hash;

/// Magic number identifying osmcodec payloads.
///
/// This value is fixed and must never change across versions.
pub const MAGIC: u32 = u32::from_le_bytes(*b"OSMB");

/// Current wire format version.
pub const VERSION: u8 = 1;

/// Header size in bytes (18 total).
pub const HEADER_SIZE: usize = 4 + 1 + 1 + 8 + 4;

/// What a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PayloadKind {
    /// A batch of nodes.
    Nodes = 1,
    /// A batch of ways.
    Ways = 2,
    /// A batch of relations.
    Relations = 3,
    /// A snapshot document with nodes, ways and relations.
    Osm = 4,
    /// A changeset with its create/modify/delete groups.
    Changeset = 5,
}

impl PayloadKind {
    /// Parses a payload kind from a raw byte.
    pub const fn parse(kind: u8) -> Result<Self, DecodeError> {
        match kind {
            1 => Ok(Self::Nodes),
            2 => Ok(Self::Ways),
            3 => Ok(Self::Relations),
            4 => Ok(Self::Osm),
            5 => Ok(Self::Changeset),
            _ => Err(DecodeError::UnknownPayloadKind { kind }),
        }
    }

    /// Returns the raw kind byte.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Payload header.
///
/// This struct represents the header fields *after* the magic number.
/// The magic number is validated separately during decoding and is not
/// stored in this struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadHeader {
    /// Wire format version.
    pub version: u8,
    /// Payload kind.
    pub kind: PayloadKind,
    /// Truncated BLAKE3 digest of the payload bytes.
    pub payload_hash: u64,
    /// Payload length in bytes.
    pub payload_len: u32,
}

impl PayloadHeader {
    /// Creates a header describing `payload`.
    pub fn for_payload(kind: PayloadKind, payload: &[u8]) -> Result<Self, EncodeError> {
        let payload_len = u32::try_from(payload.len()).map_err(|_| EncodeError::LengthOverflow {
            length: payload.len(),
        })?;
        Ok(Self {
            version: VERSION,
            kind,
            payload_hash: payload_hash(payload),
            payload_len,
        })
    }
}
