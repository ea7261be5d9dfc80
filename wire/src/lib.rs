//! Wire framing and payload layout for the osmcodec binary format.
//!
//! This crate handles the outer binary format: the payload header, section
//! framing, integrity hashing, and limit enforcement. It does not know about
//! map elements, only the structure of payloads.
//!
//! # Design Principles
//!
//! - **Stable wire format** - The format is versioned and the header carries
//!   a version byte right after the magic.
//! - **Bounded decoding** - All length fields are validated against limits before iteration.
//! - **No domain knowledge** - Section bodies are opaque byte slices here.

mod error;
mod hash;
mod header;
mod limits;
mod payload;

pub use error::{DecodeError, EncodeError, LimitKind, SectionFramingError, WireResult};
pub use hash::payload_hash;
pub use header::{PayloadHeader, PayloadKind, HEADER_SIZE, MAGIC, VERSION};
pub use limits::Limits;
pub use payload::{
    decode_header, decode_payload, decode_sections, encode_header, encode_payload, encode_section,
    SectionTag, WirePayload, WireSection,
};
