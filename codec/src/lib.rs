//! Compact binary encoding for OpenStreetMap map-edit records.
//!
//! This is the main codec crate that ties together bitstream, wire, and model
//! to encode nodes, ways, relations and changesets.
//!
//! # Features
//!
//! - Deduplicating string table shared by every element in a payload
//! - Per-element fragments, delta-encoded against the preceding element
//! - Minor-version histories stored as deltas, with repeated member lists
//!   collapsed to a single marker
//! - Batch, snapshot and changeset payloads framed by the wire crate
//!
//! # Design Principles
//!
//! - **Lossless** - Decoding an encoded value yields an equal value, including
//!   the difference between absent and empty collections.
//! - **Bounded** - Untrusted input is checked against [`CodecLimits`] and
//!   [`WireLimits`] before anything is allocated for it.
//! - **Deterministic** - Same inputs produce same outputs.

mod batch;
mod changeset;
mod coords;
mod element;
mod error;
mod info;
mod limits;
mod minor;
mod node;
mod relation;
mod sections;
mod strings;
mod way;

pub use batch::{
    decode_nodes, decode_osm, decode_relations, decode_ways, encode_nodes, encode_osm,
    encode_relations, encode_ways, section_element_count,
};
pub use changeset::{decode_changeset, encode_changeset};
pub use coords::COORDINATE_SCALE;
pub use element::{decode_element, encode_element};
pub use error::{
    CodecError, CodecResult, DeltaReason, IndexKind, LimitKind, SchemaReason,
};
pub use limits::CodecLimits;
pub use node::{decode_node, encode_node};
pub use relation::{decode_relation, encode_relation};
pub use strings::{decode_string_table, encode_string_table, resolve, StringTable};
pub use way::{decode_way, encode_way};
pub use wire::Limits as WireLimits;
