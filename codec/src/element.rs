//! Dispatch over the closed set of element kinds.

use model::{Element, ElementKind};

use crate::error::CodecResult;
use crate::limits::CodecLimits;
use crate::node::{decode_node, encode_node};
use crate::relation::{decode_relation, encode_relation};
use crate::strings::StringTable;
use crate::way::{decode_way, encode_way};

/// Encodes any element into a standalone fragment.
///
/// `previous` only serves as a delta base when it has the same kind.
pub fn encode_element(
    element: &Element,
    previous: Option<&Element>,
    table: &mut StringTable,
    include_tags: bool,
) -> CodecResult<Vec<u8>> {
    match element {
        Element::Node(node) => {
            let previous = match previous {
                Some(Element::Node(previous)) => Some(previous),
                _ => None,
            };
            encode_node(node, previous, table, include_tags)
        }
        Element::Way(way) => {
            let previous = match previous {
                Some(Element::Way(previous)) => Some(previous),
                _ => None,
            };
            encode_way(way, previous, table, include_tags)
        }
        Element::Relation(relation) => {
            let previous = match previous {
                Some(Element::Relation(previous)) => Some(previous),
                _ => None,
            };
            encode_relation(relation, previous, table, include_tags)
        }
    }
}

/// Decodes a fragment of the given kind produced by [`encode_element`].
pub fn decode_element(
    kind: ElementKind,
    fragment: &[u8],
    strings: &[String],
    previous: Option<&Element>,
    limits: &CodecLimits,
) -> CodecResult<Element> {
    Ok(match kind {
        ElementKind::Node => {
            let previous = match previous {
                Some(Element::Node(previous)) => Some(previous),
                _ => None,
            };
            Element::Node(decode_node(fragment, strings, previous, limits)?)
        }
        ElementKind::Way => {
            let previous = match previous {
                Some(Element::Way(previous)) => Some(previous),
                _ => None,
            };
            Element::Way(decode_way(fragment, strings, previous, limits)?)
        }
        ElementKind::Relation => {
            let previous = match previous {
                Some(Element::Relation(previous)) => Some(previous),
                _ => None,
            };
            Element::Relation(decode_relation(fragment, strings, previous, limits)?)
        }
    })
}
