//! Documents that group elements: snapshots, changes and changesets.

use crate::element::{Node, Relation, Way};
use crate::ids::{ChangesetId, UserId};

/// A snapshot document: elements of each kind in document order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Osm {
    pub nodes: Vec<Node>,
    pub ways: Vec<Way>,
    pub relations: Vec<Relation>,
}

impl Osm {
    /// Total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Elements partitioned by what happened to them.
///
/// A group that is `None` did not appear at all.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Change {
    pub create: Option<Osm>,
    pub modify: Option<Osm>,
    pub delete: Option<Osm>,
}

impl Change {
    /// Iterates over the present groups with their names.
    pub fn groups(&self) -> impl Iterator<Item = (&'static str, &Osm)> {
        [
            ("create", self.create.as_ref()),
            ("modify", self.modify.as_ref()),
            ("delete", self.delete.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, osm)| osm.map(|osm| (name, osm)))
    }
}

/// A changeset: author identity plus the change it made.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Changeset {
    pub id: ChangesetId,
    pub user_id: UserId,
    pub user: String,
    pub change: Change,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;

    #[test]
    fn osm_len_counts_all_kinds() {
        let osm = Osm {
            nodes: vec![Node::default(), Node::default()],
            ways: vec![Way::default()],
            relations: Vec::new(),
        };
        assert_eq!(osm.len(), 3);
        assert!(!osm.is_empty());
        assert!(Osm::default().is_empty());
    }

    #[test]
    fn change_groups_skip_absent() {
        let change = Change {
            create: Some(Osm::default()),
            modify: None,
            delete: Some(Osm {
                nodes: vec![Node {
                    id: NodeId::new(1),
                    ..Node::default()
                }],
                ..Osm::default()
            }),
        };
        let names: Vec<_> = change.groups().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["create", "delete"]);
    }
}
