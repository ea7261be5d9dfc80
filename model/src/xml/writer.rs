use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::format_timestamp;
use crate::document::{Change, Osm};
use crate::element::{Member, Minor, Node, Relation, Way};
use crate::error::{XmlError, XmlResult};
use crate::ids::{ChangesetId, NodeId, Timestamp, UserId};
use crate::tags::Tags;

const GENERATOR: &str = "osmcodec";

type XmlWriter = Writer<Vec<u8>>;

/// Writes an `<osm>` snapshot document.
pub fn write_osm(osm: &Osm) -> XmlResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(root("osm")))?;
    write_elements(&mut writer, osm)?;
    writer.write_event(Event::End(BytesEnd::new("osm")))?;
    finish(writer)
}

/// Writes an `<osmChange>` document with one block per present group.
pub fn write_change(change: &Change) -> XmlResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(root("osmChange")))?;
    for (name, osm) in change.groups() {
        if osm.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
            continue;
        }
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        write_elements(&mut writer, osm)?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    writer.write_event(Event::End(BytesEnd::new("osmChange")))?;
    finish(writer)
}

fn root(name: &str) -> BytesStart<'_> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("version", "0.6"));
    start.push_attribute(("generator", GENERATOR));
    start
}

fn finish(writer: XmlWriter) -> XmlResult<String> {
    String::from_utf8(writer.into_inner()).map_err(|_| XmlError::InvalidUtf8)
}

fn write_elements(writer: &mut XmlWriter, osm: &Osm) -> XmlResult<()> {
    for node in &osm.nodes {
        write_node(writer, node)?;
    }
    for way in &osm.ways {
        write_way(writer, way)?;
    }
    for relation in &osm.relations {
        write_relation(writer, relation)?;
    }
    Ok(())
}

fn write_node(writer: &mut XmlWriter, node: &Node) -> XmlResult<()> {
    let mut start = BytesStart::new("node");
    let id = node.id.to_string();
    start.push_attribute(("id", id.as_str()));
    push_identity(
        &mut start,
        node.version,
        node.changeset,
        node.timestamp,
        node.user_id,
        &node.user,
    )?;
    start.push_attribute(("visible", if node.visible { "true" } else { "false" }));
    if let Some(coords) = node.coords {
        start.push_attribute(("lat", coords.lat.to_string().as_str()));
        start.push_attribute(("lon", coords.lon.to_string().as_str()));
    }

    if !has_entries(node.tags.as_ref()) {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    write_tags(writer, node.tags.as_ref())?;
    writer.write_event(Event::End(BytesEnd::new("node")))?;
    Ok(())
}

fn write_way(writer: &mut XmlWriter, way: &Way) -> XmlResult<()> {
    let mut start = BytesStart::new("way");
    let id = way.id.to_string();
    start.push_attribute(("id", id.as_str()));
    push_identity(
        &mut start,
        way.version,
        way.changeset,
        way.timestamp,
        way.user_id,
        &way.user,
    )?;
    start.push_attribute(("visible", if way.visible { "true" } else { "false" }));

    if way.nodes.is_empty() && !has_entries(way.tags.as_ref()) && way.minors.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for node in &way.nodes {
        write_nd(writer, *node)?;
    }
    write_tags(writer, way.tags.as_ref())?;
    for minor in way.minors.iter().flatten() {
        write_minor(writer, minor, |writer, node| write_nd(writer, *node))?;
    }
    writer.write_event(Event::End(BytesEnd::new("way")))?;
    Ok(())
}

fn write_relation(writer: &mut XmlWriter, relation: &Relation) -> XmlResult<()> {
    let mut start = BytesStart::new("relation");
    let id = relation.id.to_string();
    start.push_attribute(("id", id.as_str()));
    push_identity(
        &mut start,
        relation.version,
        relation.changeset,
        relation.timestamp,
        relation.user_id,
        &relation.user,
    )?;
    start.push_attribute(("visible", if relation.visible { "true" } else { "false" }));

    if relation.members.is_empty()
        && !has_entries(relation.tags.as_ref())
        && relation.minors.is_none()
    {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for member in &relation.members {
        write_member(writer, member)?;
    }
    write_tags(writer, relation.tags.as_ref())?;
    for minor in relation.minors.iter().flatten() {
        write_minor(writer, minor, write_member)?;
    }
    writer.write_event(Event::End(BytesEnd::new("relation")))?;
    Ok(())
}

fn write_minor<M>(
    writer: &mut XmlWriter,
    minor: &Minor<M>,
    write_member: impl Fn(&mut XmlWriter, &M) -> XmlResult<()>,
) -> XmlResult<()> {
    let mut start = BytesStart::new("minor");
    push_identity(
        &mut start,
        minor.version,
        minor.changeset,
        minor.timestamp,
        minor.user_id,
        &minor.user,
    )?;

    let members = minor.members.as_deref().unwrap_or_default();
    if members.is_empty() && !has_entries(minor.tags.as_ref()) {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for member in members {
        write_member(writer, member)?;
    }
    write_tags(writer, minor.tags.as_ref())?;
    writer.write_event(Event::End(BytesEnd::new("minor")))?;
    Ok(())
}

fn push_identity(
    start: &mut BytesStart<'_>,
    version: u32,
    changeset: ChangesetId,
    timestamp: Timestamp,
    user_id: UserId,
    user: &str,
) -> XmlResult<()> {
    start.push_attribute(("version", version.to_string().as_str()));
    start.push_attribute(("changeset", changeset.to_string().as_str()));
    start.push_attribute(("timestamp", format_timestamp(timestamp)?.as_str()));
    start.push_attribute(("uid", user_id.to_string().as_str()));
    start.push_attribute(("user", user));
    Ok(())
}

fn write_nd(writer: &mut XmlWriter, node: NodeId) -> XmlResult<()> {
    let mut start = BytesStart::new("nd");
    start.push_attribute(("ref", node.to_string().as_str()));
    writer.write_event(Event::Empty(start))?;
    Ok(())
}

fn write_member(writer: &mut XmlWriter, member: &Member) -> XmlResult<()> {
    let mut start = BytesStart::new("member");
    start.push_attribute(("type", member.kind.as_str()));
    start.push_attribute(("ref", member.id.to_string().as_str()));
    start.push_attribute(("role", member.role.as_str()));
    writer.write_event(Event::Empty(start))?;
    Ok(())
}

fn write_tags(writer: &mut XmlWriter, tags: Option<&Tags>) -> XmlResult<()> {
    for (key, value) in tags.into_iter().flatten() {
        let mut start = BytesStart::new("tag");
        start.push_attribute(("k", key.as_str()));
        start.push_attribute(("v", value.as_str()));
        writer.write_event(Event::Empty(start))?;
    }
    Ok(())
}

fn has_entries(tags: Option<&Tags>) -> bool {
    tags.is_some_and(|tags| !tags.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Coordinates, MemberType, WayMinor};
    use crate::ids::{RelationId, WayId};
    use crate::xml::{parse_change, parse_osm};

    fn sample_osm() -> Osm {
        Osm {
            nodes: vec![Node {
                id: NodeId::new(100),
                version: 2,
                changeset: ChangesetId::new(38_162_210),
                timestamp: Timestamp::new(1_458_798_559),
                user_id: UserId::new(2_744_209),
                user: "grah735".to_string(),
                visible: true,
                coords: Some(Coordinates::new(47.123_456_7, -122.765_432_1)),
                tags: Some([("highway", "residential")].into_iter().collect()),
            }],
            ways: vec![Way {
                id: WayId::new(7),
                version: 3,
                visible: true,
                nodes: vec![NodeId::new(100), NodeId::new(101)],
                minors: Some(vec![
                    WayMinor {
                        version: 1,
                        members: Some(vec![NodeId::new(100)]),
                        ..WayMinor::default()
                    },
                    WayMinor {
                        version: 2,
                        ..WayMinor::default()
                    },
                ]),
                ..Way::default()
            }],
            relations: vec![Relation {
                id: RelationId::new(9),
                version: 1,
                visible: true,
                members: vec![
                    Member::new(MemberType::Way, 7, "outer"),
                    Member::new(MemberType::Node, 100, "label & name"),
                ],
                tags: Some([("type", "multipolygon")].into_iter().collect()),
                ..Relation::default()
            }],
        }
    }

    #[test]
    fn osm_roundtrip() {
        let osm = sample_osm();
        let xml = write_osm(&osm).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert_eq!(parse_osm(&xml).unwrap(), osm);
    }

    #[test]
    fn change_roundtrip() {
        let change = Change {
            create: Some(sample_osm()),
            modify: None,
            delete: Some(Osm::default()),
        };
        let xml = write_change(&change).unwrap();
        assert!(xml.contains("<delete/>"));
        assert_eq!(parse_change(&xml).unwrap(), change);
    }

    #[test]
    fn empty_tags_are_not_written() {
        let osm = Osm {
            nodes: vec![Node {
                id: NodeId::new(1),
                visible: true,
                coords: Some(Coordinates::new(0.0, 0.0)),
                tags: Some(Tags::new()),
                ..Node::default()
            }],
            ..Osm::default()
        };
        let xml = write_osm(&osm).unwrap();
        assert!(!xml.contains("<tag"));
        assert!(parse_osm(&xml).unwrap().nodes[0].tags.is_none());
    }
}
