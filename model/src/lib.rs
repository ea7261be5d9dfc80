//! In-memory model of OpenStreetMap map-edit records.
//!
//! This crate defines the element shapes the osmcodec binary format encodes:
//! - Identifier newtypes and tag mappings
//! - Nodes, ways and relations, with minor-version histories for the latter two
//! - Snapshot documents, changes and changesets
//!
//! # Absent versus empty
//!
//! Tag mappings, minor-version groups, and each minor's member list are held in
//! `Option`s. `None` means the collection was not recorded at all and
//! `Some(empty)` means it was recorded with no entries. The two states are
//! distinct and every codec in the workspace preserves them.
//!
//! # Features
//!
//! - `serde` derives `Serialize`/`Deserialize` for every model type.
//! - `xml` adds [`xml`] for reading and writing the XML interchange format.

mod document;
mod element;
#[cfg(feature = "xml")]
mod error;
mod ids;
mod tags;
#[cfg(feature = "xml")]
pub mod xml;

pub use document::{Change, Changeset, Osm};
pub use element::{
    Coordinates, Element, ElementKind, Member, MemberType, Minor, Node, Relation, RelationMinor,
    Way, WayMinor,
};
#[cfg(feature = "xml")]
pub use error::{XmlError, XmlResult};
pub use ids::{ChangesetId, NodeId, RelationId, Timestamp, UserId, WayId};
pub use tags::Tags;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Node::default();
        let _ = Way::default();
        let _ = Relation::default();
        let _ = WayMinor::default();
        let _ = RelationMinor::default();
        let _ = Changeset::default();
        let _ = Tags::new();
        let _ = ElementKind::Node;
    }

    #[test]
    fn entity_tags_absent_vs_empty() {
        let absent = Way::default();
        let empty = Way {
            tags: Some(Tags::new()),
            ..Way::default()
        };
        assert_ne!(absent, empty);
    }
}
