use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::parse_timestamp;
use crate::document::{Change, Osm};
use crate::element::{Coordinates, Member, MemberType, Minor, Node, Relation, Way};
use crate::error::{XmlError, XmlResult};
use crate::ids::{ChangesetId, NodeId, RelationId, Timestamp, UserId, WayId};
use crate::tags::Tags;

/// Parses an `<osm>` snapshot document.
pub fn parse_osm(input: &str) -> XmlResult<Osm> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut osm = Osm::default();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            // Wrappers such as <osm> are descended into.
            Event::Start(start) => {
                read_element(&mut reader, &start, true, &mut osm)?;
            }
            Event::Empty(start) => {
                read_element(&mut reader, &start, false, &mut osm)?;
            }
            _ => {}
        }
    }
    Ok(osm)
}

/// Parses an `<osmChange>` document.
///
/// Repeated `<create>`, `<modify>` or `<delete>` blocks are merged in order.
pub fn parse_change(input: &str) -> XmlResult<Change> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut change = Change::default();
    let mut current: Option<&'static str> = None;
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(start) => {
                if let Some(group) = group_name(start.name().as_ref()) {
                    current = Some(group);
                    group_mut(&mut change, group);
                } else if let Some(group) = current {
                    read_element(&mut reader, &start, true, group_mut(&mut change, group))?;
                }
            }
            Event::Empty(start) => {
                if let Some(group) = group_name(start.name().as_ref()) {
                    group_mut(&mut change, group);
                } else if let Some(group) = current {
                    read_element(&mut reader, &start, false, group_mut(&mut change, group))?;
                }
            }
            Event::End(end) => {
                if group_name(end.name().as_ref()).is_some() {
                    current = None;
                }
            }
            _ => {}
        }
    }
    Ok(change)
}

fn group_name(name: &[u8]) -> Option<&'static str> {
    match name {
        b"create" => Some("create"),
        b"modify" => Some("modify"),
        b"delete" => Some("delete"),
        _ => None,
    }
}

fn group_mut<'c>(change: &'c mut Change, group: &str) -> &'c mut Osm {
    let slot = match group {
        "create" => &mut change.create,
        "modify" => &mut change.modify,
        _ => &mut change.delete,
    };
    slot.get_or_insert_with(Osm::default)
}

/// Reads one element into `osm`. Other tags such as `<bounds>` are ignored.
fn read_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    has_children: bool,
    osm: &mut Osm,
) -> XmlResult<()> {
    match start.name().as_ref() {
        b"node" => osm.nodes.push(read_node(reader, start, has_children)?),
        b"way" => osm.ways.push(read_way(reader, start, has_children)?),
        b"relation" => osm.relations.push(read_relation(reader, start, has_children)?),
        _ => {}
    }
    Ok(())
}

fn read_node(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>, has_children: bool) -> XmlResult<Node> {
    let attrs = Attrs::read("node", start)?;
    let info = Info::read(&attrs)?;

    let lat = attrs.optional::<f64>("lat")?;
    let lon = attrs.optional::<f64>("lon")?;
    let coords = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        (None, _) if info.visible => {
            return Err(XmlError::MissingAttribute {
                element: "node",
                attribute: "lat",
            })
        }
        (_, None) if info.visible => {
            return Err(XmlError::MissingAttribute {
                element: "node",
                attribute: "lon",
            })
        }
        _ => None,
    };

    let mut tags = None;
    if has_children {
        while let Some((child, nested)) = next_child(reader, "node")? {
            if child.name().as_ref() == b"tag" {
                read_tag(&child, &mut tags)?;
            }
            skip_rest(reader, &child, nested)?;
        }
    }

    Ok(Node {
        id: NodeId::new(info.id),
        version: info.version,
        changeset: info.changeset,
        timestamp: info.timestamp,
        user_id: info.user_id,
        user: info.user,
        visible: info.visible,
        coords,
        tags,
    })
}

fn read_way(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>, has_children: bool) -> XmlResult<Way> {
    let attrs = Attrs::read("way", start)?;
    let info = Info::read(&attrs)?;

    let mut nodes = Vec::new();
    let mut tags = None;
    let mut minors: Option<Vec<Minor<NodeId>>> = None;
    if has_children {
        while let Some((child, nested)) = next_child(reader, "way")? {
            match child.name().as_ref() {
                b"nd" => nodes.push(read_nd(&child)?),
                b"tag" => read_tag(&child, &mut tags)?,
                b"minor" => {
                    let minor = read_minor(reader, &child, nested, |child, members| {
                        if child.name().as_ref() == b"nd" {
                            members.get_or_insert_with(Vec::new).push(read_nd(child)?);
                        }
                        Ok(())
                    })?;
                    minors.get_or_insert_with(Vec::new).push(minor);
                    continue;
                }
                _ => {}
            }
            skip_rest(reader, &child, nested)?;
        }
    }

    Ok(Way {
        id: WayId::new(info.id),
        version: info.version,
        changeset: info.changeset,
        timestamp: info.timestamp,
        user_id: info.user_id,
        user: info.user,
        visible: info.visible,
        nodes,
        tags,
        minors,
    })
}

fn read_relation(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    has_children: bool,
) -> XmlResult<Relation> {
    let attrs = Attrs::read("relation", start)?;
    let info = Info::read(&attrs)?;

    let mut members = Vec::new();
    let mut tags = None;
    let mut minors: Option<Vec<Minor<Member>>> = None;
    if has_children {
        while let Some((child, nested)) = next_child(reader, "relation")? {
            match child.name().as_ref() {
                b"member" => members.push(read_member(&child)?),
                b"tag" => read_tag(&child, &mut tags)?,
                b"minor" => {
                    let minor = read_minor(reader, &child, nested, |child, members| {
                        if child.name().as_ref() == b"member" {
                            members.get_or_insert_with(Vec::new).push(read_member(child)?);
                        }
                        Ok(())
                    })?;
                    minors.get_or_insert_with(Vec::new).push(minor);
                    continue;
                }
                _ => {}
            }
            skip_rest(reader, &child, nested)?;
        }
    }

    Ok(Relation {
        id: RelationId::new(info.id),
        version: info.version,
        changeset: info.changeset,
        timestamp: info.timestamp,
        user_id: info.user_id,
        user: info.user,
        visible: info.visible,
        members,
        tags,
        minors,
    })
}

fn read_minor<M>(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    has_children: bool,
    mut read_member: impl FnMut(&BytesStart<'_>, &mut Option<Vec<M>>) -> XmlResult<()>,
) -> XmlResult<Minor<M>> {
    let attrs = Attrs::read("minor", start)?;
    let mut minor = Minor {
        version: attrs.optional("version")?.unwrap_or_default(),
        changeset: ChangesetId::new(attrs.optional("changeset")?.unwrap_or_default()),
        timestamp: attrs.timestamp()?,
        user_id: UserId::new(attrs.optional("uid")?.unwrap_or_default()),
        user: attrs.get("user").unwrap_or_default().to_string(),
        tags: None,
        members: None,
    };

    if has_children {
        while let Some((child, nested)) = next_child(reader, "minor")? {
            if child.name().as_ref() == b"tag" {
                read_tag(&child, &mut minor.tags)?;
            } else {
                read_member(&child, &mut minor.members)?;
            }
            skip_rest(reader, &child, nested)?;
        }
    }
    Ok(minor)
}

fn read_tag(start: &BytesStart<'_>, tags: &mut Option<Tags>) -> XmlResult<()> {
    let attrs = Attrs::read("tag", start)?;
    let key = attrs.required_str("k")?;
    let value = attrs.required_str("v")?;
    tags.get_or_insert_with(Tags::new).insert(key, value);
    Ok(())
}

fn read_nd(start: &BytesStart<'_>) -> XmlResult<NodeId> {
    let attrs = Attrs::read("nd", start)?;
    Ok(NodeId::new(attrs.required("ref")?))
}

fn read_member(start: &BytesStart<'_>) -> XmlResult<Member> {
    let attrs = Attrs::read("member", start)?;
    let kind_str = attrs.required_str("type")?;
    let kind = MemberType::parse(kind_str).ok_or_else(|| XmlError::InvalidAttribute {
        element: "member",
        attribute: "type",
        value: kind_str.to_string(),
    })?;
    Ok(Member {
        kind,
        id: attrs.required("ref")?,
        role: attrs.get("role").unwrap_or_default().to_string(),
    })
}

/// Returns the next child start tag of `parent`, or `None` at its end tag.
fn next_child<'i>(
    reader: &mut Reader<&'i [u8]>,
    parent: &'static str,
) -> XmlResult<Option<(BytesStart<'i>, bool)>> {
    loop {
        match reader.read_event()? {
            Event::Start(start) => return Ok(Some((start, true))),
            Event::Empty(start) => return Ok(Some((start, false))),
            Event::End(_) => return Ok(None),
            Event::Eof => return Err(XmlError::UnexpectedEof { element: parent }),
            _ => {}
        }
    }
}

fn skip_rest(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>, has_children: bool) -> XmlResult<()> {
    if has_children {
        reader.read_to_end(start.name())?;
    }
    Ok(())
}

/// Identity attributes shared by every element.
struct Info {
    id: i64,
    version: u32,
    changeset: ChangesetId,
    timestamp: Timestamp,
    user_id: UserId,
    user: String,
    visible: bool,
}

impl Info {
    fn read(attrs: &Attrs) -> XmlResult<Self> {
        Ok(Self {
            id: attrs.required("id")?,
            version: attrs.optional("version")?.unwrap_or_default(),
            changeset: ChangesetId::new(attrs.optional("changeset")?.unwrap_or_default()),
            timestamp: attrs.timestamp()?,
            user_id: UserId::new(attrs.optional("uid")?.unwrap_or_default()),
            user: attrs.get("user").unwrap_or_default().to_string(),
            visible: attrs.optional("visible")?.unwrap_or(true),
        })
    }
}

/// Unescaped attributes of one start tag.
struct Attrs {
    element: &'static str,
    values: Vec<(Vec<u8>, String)>,
}

impl Attrs {
    fn read(element: &'static str, start: &BytesStart<'_>) -> XmlResult<Self> {
        let mut values = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?.into_owned();
            values.push((attr.key.as_ref().to_vec(), value));
        }
        Ok(Self { element, values })
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key.as_slice() == name.as_bytes())
            .map(|(_, value)| value.as_str())
    }

    fn required_str(&self, name: &'static str) -> XmlResult<&str> {
        self.get(name).ok_or(XmlError::MissingAttribute {
            element: self.element,
            attribute: name,
        })
    }

    fn required<T: FromStr>(&self, name: &'static str) -> XmlResult<T> {
        self.optional(name)?.ok_or(XmlError::MissingAttribute {
            element: self.element,
            attribute: name,
        })
    }

    fn optional<T: FromStr>(&self, name: &'static str) -> XmlResult<Option<T>> {
        self.get(name)
            .map(|value| {
                value.parse().map_err(|_| XmlError::InvalidAttribute {
                    element: self.element,
                    attribute: name,
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    fn timestamp(&self) -> XmlResult<Timestamp> {
        self.get("timestamp")
            .map_or(Ok(Timestamp::default()), |value| {
                parse_timestamp(self.element, value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_node_with_tags() {
        let osm = parse_osm(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <osm version="0.6">
              <node id="100" version="2" changeset="7" timestamp="2016-03-24T05:49:19Z"
                    uid="11" user="mapper" visible="true" lat="47.1234567" lon="-122.7654321">
                <tag k="highway" v="residential"/>
              </node>
            </osm>"#,
        )
        .unwrap();

        assert_eq!(osm.nodes.len(), 1);
        let node = &osm.nodes[0];
        assert_eq!(node.id, NodeId::new(100));
        assert_eq!(node.version, 2);
        assert_eq!(node.user, "mapper");
        assert_eq!(node.coords, Some(Coordinates::new(47.123_456_7, -122.765_432_1)));
        assert_eq!(node.tags.as_ref().unwrap().get("highway"), Some("residential"));
    }

    #[test]
    fn parse_node_without_tags_is_absent() {
        let osm = parse_osm(r#"<osm><node id="1" lat="1" lon="2"/></osm>"#).unwrap();
        assert!(osm.nodes[0].tags.is_none());
        assert!(osm.nodes[0].visible);
    }

    #[test]
    fn parse_node_requires_coordinates_when_visible() {
        let err = parse_osm(r#"<osm><node id="1" lon="2"/></osm>"#).unwrap_err();
        assert!(matches!(
            err,
            XmlError::MissingAttribute {
                element: "node",
                attribute: "lat"
            }
        ));

        let osm = parse_osm(r#"<osm><node id="1" visible="false"/></osm>"#).unwrap();
        assert!(osm.nodes[0].coords.is_none());
    }

    #[test]
    fn parse_requires_id() {
        let err = parse_osm(r#"<osm><way version="1"/></osm>"#).unwrap_err();
        assert!(matches!(
            err,
            XmlError::MissingAttribute {
                element: "way",
                attribute: "id"
            }
        ));
    }

    #[test]
    fn parse_way_with_minors() {
        let osm = parse_osm(
            r#"<osm>
              <way id="5" version="3">
                <nd ref="1"/><nd ref="2"/>
                <minor version="1" changeset="9" uid="4" user="a">
                  <nd ref="1"/>
                </minor>
                <minor version="2" changeset="10"/>
              </way>
            </osm>"#,
        )
        .unwrap();

        let way = &osm.ways[0];
        assert_eq!(way.nodes, vec![NodeId::new(1), NodeId::new(2)]);
        let minors = way.minors.as_ref().unwrap();
        assert_eq!(minors.len(), 2);
        assert_eq!(minors[0].members, Some(vec![NodeId::new(1)]));
        assert_eq!(minors[0].user, "a");
        assert_eq!(minors[1].members, None);
    }

    #[test]
    fn parse_relation_members() {
        let osm = parse_osm(
            r#"<osm>
              <relation id="8">
                <member type="node" ref="1" role="stop"/>
                <member type="way" ref="2" role=""/>
                <tag k="type" v="route"/>
              </relation>
            </osm>"#,
        )
        .unwrap();

        let relation = &osm.relations[0];
        assert_eq!(
            relation.members,
            vec![
                Member::new(MemberType::Node, 1, "stop"),
                Member::new(MemberType::Way, 2, ""),
            ]
        );
        assert!(relation.minors.is_none());
    }

    #[test]
    fn parse_relation_rejects_unknown_member_type() {
        let err = parse_osm(r#"<osm><relation id="1"><member type="area" ref="1"/></relation></osm>"#)
            .unwrap_err();
        assert!(matches!(
            err,
            XmlError::InvalidAttribute {
                attribute: "type",
                ..
            }
        ));
    }

    #[test]
    fn parse_change_groups() {
        let change = parse_change(
            r#"<osmChange version="0.6">
              <create><node id="-1" lat="1" lon="1"/></create>
              <delete><way id="3" visible="false"/></delete>
              <create><node id="-2" lat="2" lon="2"/></create>
            </osmChange>"#,
        )
        .unwrap();

        assert_eq!(change.create.as_ref().unwrap().nodes.len(), 2);
        assert!(change.modify.is_none());
        let delete = change.delete.as_ref().unwrap();
        assert_eq!(delete.ways[0].id, WayId::new(3));
        assert!(!delete.ways[0].visible);
    }

    #[test]
    fn parse_ignores_non_element_tags() {
        let osm = parse_osm(
            r#"<osm version="0.6">
  <bounds minlat="51.5" minlon="-0.1" maxlat="51.6" maxlon="0.0"/>
  <node id="1" lat="51.5" lon="-0.1"/>
</osm>"#,
        )
        .unwrap();
        assert_eq!(osm.nodes.len(), 1);
        assert!(osm.ways.is_empty());
        assert!(osm.relations.is_empty());
    }

    #[test]
    fn parse_unescapes_values() {
        let osm =
            parse_osm(r#"<osm><node id="1" lat="0" lon="0"><tag k="name" v="A &amp; B"/></node></osm>"#)
                .unwrap();
        assert_eq!(osm.nodes[0].tags.as_ref().unwrap().get("name"), Some("A & B"));
    }

    #[test]
    fn parse_reports_unterminated_element() {
        assert!(parse_osm(r#"<osm><way id="1"><nd ref="1"/>"#).is_err());
    }
}
