//! Nodes, ways, relations and their minor-version histories.

use crate::ids::{ChangesetId, NodeId, RelationId, Timestamp, UserId, WayId};
use crate::tags::Tags;

/// The closed set of element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A point element.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub version: u32,
    pub changeset: ChangesetId,
    pub timestamp: Timestamp,
    pub user_id: UserId,
    pub user: String,
    pub visible: bool,
    /// `None` only for deletion stubs.
    pub coords: Option<Coordinates>,
    pub tags: Option<Tags>,
}

/// An ordered list of node references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Way {
    pub id: WayId,
    pub version: u32,
    pub changeset: ChangesetId,
    pub timestamp: Timestamp,
    pub user_id: UserId,
    pub user: String,
    pub visible: bool,
    pub nodes: Vec<NodeId>,
    pub tags: Option<Tags>,
    /// Minor versions recorded between this way's major versions.
    pub minors: Option<Vec<WayMinor>>,
}

/// What a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

impl MemberType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    /// Parses the XML spelling of a member type.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "node" => Some(Self::Node),
            "way" => Some(Self::Way),
            "relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

impl From<MemberType> for ElementKind {
    fn from(kind: MemberType) -> Self {
        match kind {
            MemberType::Node => Self::Node,
            MemberType::Way => Self::Way,
            MemberType::Relation => Self::Relation,
        }
    }
}

/// One `(type, ref, role)` member of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Member {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: MemberType,
    #[cfg_attr(feature = "serde", serde(rename = "ref"))]
    pub id: i64,
    pub role: String,
}

impl Member {
    #[must_use]
    pub fn new(kind: MemberType, id: i64, role: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            role: role.into(),
        }
    }
}

/// A relation element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relation {
    pub id: RelationId,
    pub version: u32,
    pub changeset: ChangesetId,
    pub timestamp: Timestamp,
    pub user_id: UserId,
    pub user: String,
    pub visible: bool,
    pub members: Vec<Member>,
    pub tags: Option<Tags>,
    /// Minor versions recorded between this relation's major versions.
    pub minors: Option<Vec<RelationMinor>>,
}

/// One intermediate version of a way or relation.
///
/// `members` is `None` when the minor version records no member list, which is
/// different from recording an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Minor<M> {
    pub version: u32,
    pub changeset: ChangesetId,
    pub timestamp: Timestamp,
    pub user_id: UserId,
    pub user: String,
    pub tags: Option<Tags>,
    pub members: Option<Vec<M>>,
}

impl<M> Default for Minor<M> {
    fn default() -> Self {
        Self {
            version: 0,
            changeset: ChangesetId::default(),
            timestamp: Timestamp::default(),
            user_id: UserId::default(),
            user: String::new(),
            tags: None,
            members: None,
        }
    }
}

pub type WayMinor = Minor<NodeId>;
pub type RelationMinor = Minor<Member>;

/// Any one element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Element {
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Node(_) => ElementKind::Node,
            Self::Way(_) => ElementKind::Way,
            Self::Relation(_) => ElementKind::Relation,
        }
    }

    /// Raw id, unique within the element's kind.
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Node(node) => node.id.raw(),
            Self::Way(way) => way.id.raw(),
            Self::Relation(relation) => relation.id.raw(),
        }
    }

    #[must_use]
    pub const fn tags(&self) -> Option<&Tags> {
        match self {
            Self::Node(node) => node.tags.as_ref(),
            Self::Way(way) => way.tags.as_ref(),
            Self::Relation(relation) => relation.tags.as_ref(),
        }
    }
}

impl From<Node> for Element {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Way> for Element {
    fn from(way: Way) -> Self {
        Self::Way(way)
    }
}

impl From<Relation> for Element {
    fn from(relation: Relation) -> Self {
        Self::Relation(relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_kind_and_id() {
        let element = Element::from(Way {
            id: WayId::new(12),
            ..Way::default()
        });
        assert_eq!(element.kind(), ElementKind::Way);
        assert_eq!(element.id(), 12);
        assert!(element.tags().is_none());
    }

    #[test]
    fn member_type_parse() {
        assert_eq!(MemberType::parse("way"), Some(MemberType::Way));
        assert_eq!(MemberType::parse("area"), None);
        for kind in [MemberType::Node, MemberType::Way, MemberType::Relation] {
            assert_eq!(MemberType::parse(kind.as_str()), Some(kind));
            assert_eq!(ElementKind::from(kind).as_str(), kind.as_str());
        }
    }

    #[test]
    fn minor_default_has_absent_collections() {
        let minor = WayMinor::default();
        assert!(minor.members.is_none());
        assert!(minor.tags.is_none());
        assert_ne!(
            minor,
            WayMinor {
                members: Some(Vec::new()),
                ..WayMinor::default()
            }
        );
    }
}
