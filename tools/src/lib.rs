//! Encoding, decoding and introspection tools for osmcodec payloads.
//!
//! This crate backs the `osmcodec-tools` binary:
//!
//! - Encode OSM XML snapshots and change files into binary payloads
//! - Decode payloads of any kind back into JSON, a text summary, or XML
//! - Explain payload size by section, with element and string counts
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what the codec is doing.

use std::borrow::Cow;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use codec::{CodecLimits, CodecResult, WireLimits};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use model::{Changeset, ChangesetId, Node, Osm, Relation, UserId, Way};
use serde::Serialize;
use wire::{PayloadHeader, PayloadKind, SectionTag, WireSection};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// XML document flavours accepted by [`encode_xml`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlInput {
    /// An `<osm>` snapshot, encoded as an osm payload.
    Osm,
    /// An `<osmChange>` document, encoded as a changeset payload.
    Change,
}

impl XmlInput {
    /// `.osc` files are change documents; everything else is read as a snapshot.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("osc") => Self::Change,
            _ => Self::Osm,
        }
    }
}

/// Identity attached to a changeset payload built from a change document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangesetIdentity {
    pub id: i64,
    pub user_id: i64,
    pub user: String,
}

/// Parses an XML document and encodes it into a payload.
pub fn encode_xml(
    input: &str,
    flavour: XmlInput,
    identity: &ChangesetIdentity,
    limits: &CodecLimits,
) -> Result<Vec<u8>> {
    match flavour {
        XmlInput::Osm => {
            let osm = model::xml::parse_osm(input).context("parse osm xml")?;
            codec::encode_osm(&osm, limits).context("encode osm payload")
        }
        XmlInput::Change => {
            let change = model::xml::parse_change(input).context("parse osmChange xml")?;
            let changeset = Changeset {
                id: ChangesetId::new(identity.id),
                user_id: UserId::new(identity.user_id),
                user: identity.user.clone(),
                change,
            };
            codec::encode_changeset(&changeset, limits).context("encode changeset payload")
        }
    }
}

/// A decoded payload of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Decoded {
    Nodes(Vec<Node>),
    Ways(Vec<Way>),
    Relations(Vec<Relation>),
    Osm(Osm),
    Changeset(Changeset),
}

/// Decodes a payload, dispatching on the kind recorded in its header.
pub fn decode_any(bytes: &[u8], wire_limits: &WireLimits, limits: &CodecLimits) -> Result<Decoded> {
    let header = wire::decode_header(bytes, wire_limits).context("decode payload header")?;
    let decoded: CodecResult<Decoded> = match header.kind {
        PayloadKind::Nodes => codec::decode_nodes(bytes, wire_limits, limits).map(Decoded::Nodes),
        PayloadKind::Ways => codec::decode_ways(bytes, wire_limits, limits).map(Decoded::Ways),
        PayloadKind::Relations => {
            codec::decode_relations(bytes, wire_limits, limits).map(Decoded::Relations)
        }
        PayloadKind::Osm => codec::decode_osm(bytes, wire_limits, limits).map(Decoded::Osm),
        PayloadKind::Changeset => {
            codec::decode_changeset(bytes, wire_limits, limits).map(Decoded::Changeset)
        }
    };
    decoded.with_context(|| format!("decode {:?} payload", header.kind))
}

/// Renders a decoded payload back to OSM XML.
///
/// Batches and snapshots become `<osm>` documents; changesets become
/// `<osmChange>` documents without their identity fields.
pub fn to_xml(decoded: &Decoded) -> Result<String> {
    let xml = match decoded {
        Decoded::Nodes(nodes) => model::xml::write_osm(&Osm {
            nodes: nodes.clone(),
            ..Osm::default()
        }),
        Decoded::Ways(ways) => model::xml::write_osm(&Osm {
            ways: ways.clone(),
            ..Osm::default()
        }),
        Decoded::Relations(relations) => model::xml::write_osm(&Osm {
            relations: relations.clone(),
            ..Osm::default()
        }),
        Decoded::Osm(osm) => model::xml::write_osm(osm),
        Decoded::Changeset(changeset) => model::xml::write_change(&changeset.change),
    };
    xml.context("write xml")
}

/// Text summary of a decoded payload.
pub fn format_decode_pretty(decoded: &Decoded) -> String {
    decoded.to_string()
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nodes(nodes) => {
                writeln!(f, "nodes: {}", nodes.len())?;
                write_nodes(f, nodes, "  ")
            }
            Self::Ways(ways) => {
                writeln!(f, "ways: {}", ways.len())?;
                write_ways(f, ways, "  ")
            }
            Self::Relations(relations) => {
                writeln!(f, "relations: {}", relations.len())?;
                write_relations(f, relations, "  ")
            }
            Self::Osm(osm) => write_osm(f, osm, ""),
            Self::Changeset(changeset) => {
                writeln!(
                    f,
                    "changeset {} by {:?} (uid {})",
                    changeset.id, changeset.user, changeset.user_id
                )?;
                for (name, osm) in changeset.change.groups() {
                    writeln!(f, "{name}:")?;
                    write_osm(f, osm, "  ")?;
                }
                Ok(())
            }
        }
    }
}

fn write_osm(f: &mut fmt::Formatter<'_>, osm: &Osm, indent: &str) -> fmt::Result {
    writeln!(
        f,
        "{indent}{} nodes, {} ways, {} relations",
        osm.nodes.len(),
        osm.ways.len(),
        osm.relations.len()
    )?;
    let nested = format!("{indent}  ");
    write_nodes(f, &osm.nodes, &nested)?;
    write_ways(f, &osm.ways, &nested)?;
    write_relations(f, &osm.relations, &nested)
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node], indent: &str) -> fmt::Result {
    for node in nodes {
        write!(f, "{indent}node {} v{}", node.id, node.version)?;
        if let Some(coords) = node.coords {
            write!(f, " at {:.7},{:.7}", coords.lat, coords.lon)?;
        }
        if !node.visible {
            write!(f, " (deleted)")?;
        }
        writeln!(f, " tags={}", tag_count(node.tags.as_ref()))?;
    }
    Ok(())
}

fn write_ways(f: &mut fmt::Formatter<'_>, ways: &[Way], indent: &str) -> fmt::Result {
    for way in ways {
        writeln!(
            f,
            "{indent}way {} v{} nodes={} tags={} minors={}",
            way.id,
            way.version,
            way.nodes.len(),
            tag_count(way.tags.as_ref()),
            way.minors.as_ref().map_or(0, Vec::len)
        )?;
    }
    Ok(())
}

fn write_relations(f: &mut fmt::Formatter<'_>, relations: &[Relation], indent: &str) -> fmt::Result {
    for relation in relations {
        writeln!(
            f,
            "{indent}relation {} v{} members={} tags={} minors={}",
            relation.id,
            relation.version,
            relation.members.len(),
            tag_count(relation.tags.as_ref()),
            relation.minors.as_ref().map_or(0, Vec::len)
        )?;
    }
    Ok(())
}

fn tag_count(tags: Option<&model::Tags>) -> String {
    tags.map_or_else(|| "-".to_string(), |tags| tags.len().to_string())
}

/// Size breakdown of one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub header: PayloadHeader,
    pub total_bytes: usize,
    pub sections: Vec<SectionSummary>,
}

/// One section of a payload. Group sections list their nested sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub tag: SectionTag,
    pub byte_len: usize,
    /// Strings in a table, elements in an element section or group.
    pub count: Option<usize>,
    pub children: Vec<SectionSummary>,
}

/// Decodes payload framing and summarizes every section.
pub fn inspect_payload(
    bytes: &[u8],
    wire_limits: &WireLimits,
    limits: &CodecLimits,
) -> Result<InspectReport> {
    let payload = wire::decode_payload(bytes, wire_limits).context("decode payload framing")?;
    let sections = summarize_sections(&payload.sections, wire_limits, limits)?;
    Ok(InspectReport {
        header: payload.header,
        total_bytes: bytes.len(),
        sections,
    })
}

fn summarize_sections(
    sections: &[WireSection<'_>],
    wire_limits: &WireLimits,
    limits: &CodecLimits,
) -> Result<Vec<SectionSummary>> {
    let mut summaries = Vec::with_capacity(sections.len());
    for section in sections {
        let mut summary = SectionSummary {
            tag: section.tag,
            byte_len: section.body.len(),
            count: None,
            children: Vec::new(),
        };
        match section.tag {
            SectionTag::StringTable => {
                let strings = codec::decode_string_table(section.body, limits)
                    .context("decode string table")?;
                summary.count = Some(strings.len());
            }
            SectionTag::Nodes | SectionTag::Ways | SectionTag::Relations => {
                summary.count = Some(
                    codec::section_element_count(section)
                        .with_context(|| format!("read {:?} element count", section.tag))?,
                );
            }
            tag if tag.is_group() => {
                let nested = wire::decode_sections(section.body, wire_limits)
                    .with_context(|| format!("decode {tag:?} group"))?;
                summary.children = summarize_sections(&nested, wire_limits, limits)?;
                summary.count = Some(summary.children.iter().filter_map(|child| child.count).sum());
            }
            _ => {}
        }
        summaries.push(summary);
    }
    Ok(summaries)
}

/// Gzip-compresses a payload.
pub fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).context("gzip payload")?;
    encoder.finish().context("finish gzip stream")
}

/// Returns `bytes` unchanged, or their decompressed form if they start with
/// the gzip magic. Decompressed output larger than `max_bytes` is rejected.
pub fn maybe_gunzip(bytes: &[u8], max_bytes: usize) -> Result<Cow<'_, [u8]>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(Cow::Borrowed(bytes));
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .take((max_bytes as u64).saturating_add(1))
        .read_to_end(&mut out)
        .context("gunzip payload")?;
    if out.len() > max_bytes {
        bail!("decompressed payload exceeds {max_bytes} bytes");
    }
    Ok(Cow::Owned(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osmChange version="0.6">
  <create>
    <node id="-1" version="1" changeset="7" timestamp="2016-03-24T05:49:19Z" uid="3" user="ann" lat="1.5" lon="2.5">
      <tag k="amenity" v="bench"/>
    </node>
  </create>
  <delete>
    <way id="9" version="2" changeset="7" timestamp="2016-03-24T05:49:19Z" uid="3" user="ann" visible="false"/>
  </delete>
</osmChange>"#;

    const SNAPSHOT: &str = r#"<osm version="0.6">
  <node id="1" version="1" lat="10" lon="20"/>
  <node id="2" version="1" lat="10.5" lon="20.5"/>
  <way id="3" version="1"><nd ref="1"/><nd ref="2"/><tag k="highway" v="path"/></way>
</osm>"#;

    fn identity() -> ChangesetIdentity {
        ChangesetIdentity {
            id: 7,
            user_id: 3,
            user: "ann".to_string(),
        }
    }

    #[test]
    fn xml_input_from_extension() {
        assert_eq!(XmlInput::from_path(Path::new("a/b.osc")), XmlInput::Change);
        assert_eq!(XmlInput::from_path(Path::new("b.OSC")), XmlInput::Change);
        assert_eq!(XmlInput::from_path(Path::new("b.osm")), XmlInput::Osm);
        assert_eq!(XmlInput::from_path(Path::new("noext")), XmlInput::Osm);
    }

    #[test]
    fn change_encodes_to_changeset_payload() {
        let limits = CodecLimits::default();
        let bytes = encode_xml(CHANGE, XmlInput::Change, &identity(), &limits).unwrap();
        let decoded = decode_any(&bytes, &WireLimits::default(), &limits).unwrap();
        let Decoded::Changeset(changeset) = &decoded else {
            panic!("expected changeset, got {decoded:?}");
        };
        assert_eq!(changeset.id, ChangesetId::new(7));
        assert_eq!(changeset.user, "ann");
        assert!(changeset.change.modify.is_none());

        let xml = to_xml(&decoded).unwrap();
        assert_eq!(model::xml::parse_change(&xml).unwrap(), changeset.change);

        let pretty = format_decode_pretty(&decoded);
        assert!(pretty.starts_with("changeset 7 by \"ann\" (uid 3)"));
        assert!(pretty.contains("node -1 v1 at 1.5000000,2.5000000 tags=1"));
        assert!(pretty.contains("way 9 v2 nodes=0 tags=- minors=0"));
    }

    #[test]
    fn decoded_serializes_with_kind_tag() {
        let limits = CodecLimits::default();
        let bytes = encode_xml(SNAPSHOT, XmlInput::Osm, &identity(), &limits).unwrap();
        let decoded = decode_any(&bytes, &WireLimits::default(), &limits).unwrap();
        let json = serde_json::to_value(&decoded).unwrap();
        assert_eq!(json["kind"], "osm");
        assert_eq!(json["data"]["nodes"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn inspect_counts_sections() {
        let limits = CodecLimits::default();
        let bytes = encode_xml(CHANGE, XmlInput::Change, &identity(), &limits).unwrap();
        let report = inspect_payload(&bytes, &WireLimits::default(), &limits).unwrap();
        assert_eq!(report.header.kind, PayloadKind::Changeset);
        assert_eq!(report.total_bytes, bytes.len());

        let tags: Vec<SectionTag> = report.sections.iter().map(|s| s.tag).collect();
        assert_eq!(
            tags,
            vec![
                SectionTag::StringTable,
                SectionTag::ChangesetInfo,
                SectionTag::Create,
                SectionTag::Delete
            ]
        );
        // ann, amenity, bench
        assert_eq!(report.sections[0].count, Some(3));
        assert_eq!(report.sections[1].count, None);
        assert_eq!(report.sections[2].count, Some(1));
        assert_eq!(report.sections[2].children.len(), 3);
        assert_eq!(report.sections[3].children[1].count, Some(1));
    }

    #[test]
    fn gzip_is_detected() {
        let limits = CodecLimits::default();
        let bytes = encode_xml(SNAPSHOT, XmlInput::Osm, &identity(), &limits).unwrap();
        let compressed = gzip(&bytes).unwrap();
        assert!(compressed.starts_with(&GZIP_MAGIC));

        let restored = maybe_gunzip(&compressed, 1 << 20).unwrap();
        assert_eq!(restored.as_ref(), bytes.as_slice());
        assert!(matches!(maybe_gunzip(&bytes, 1 << 20).unwrap(), Cow::Borrowed(_)));
        assert!(maybe_gunzip(&compressed, 8).is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_any(b"not a payload", &WireLimits::default(), &CodecLimits::default())
            .unwrap_err();
        assert!(err.to_string().contains("decode payload header"));
    }
}
