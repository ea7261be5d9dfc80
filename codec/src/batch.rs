//! Batch payloads: a string table followed by element sections.
//!
//! Each element section body is a count followed by length-prefixed
//! fragments. Every fragment is encoded against the element before it, so
//! sorted batches shrink to small id and coordinate deltas.

use bitstream::{BitReader, BitWriter};
use model::{Node, Osm, Relation, Way};
use tracing::debug;
use wire::{PayloadKind, SectionTag, WireSection};

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::info::read_count;
use crate::limits::CodecLimits;
use crate::node::{check_node_limits, decode_node, encode_node};
use crate::relation::{check_relation_limits, decode_relation, encode_relation};
use crate::sections::{check_section_len, expect_kind, finish_payload, SectionSet};
use crate::strings::{count_u32, decode_string_table, ensure_consumed, StringTable};
use crate::way::{check_way_limits, decode_way, encode_way};

const OSM_SECTIONS: [SectionTag; 3] = [SectionTag::Nodes, SectionTag::Ways, SectionTag::Relations];

/// Encodes a node batch into a `Nodes` payload.
pub fn encode_nodes(nodes: &[Node], limits: &CodecLimits) -> CodecResult<Vec<u8>> {
    encode_batch(
        PayloadKind::Nodes,
        SectionTag::Nodes,
        nodes,
        limits,
        check_node_limits,
        encode_node,
    )
}

/// Decodes a `Nodes` payload.
pub fn decode_nodes(
    bytes: &[u8],
    wire_limits: &wire::Limits,
    limits: &CodecLimits,
) -> CodecResult<Vec<Node>> {
    decode_batch(
        bytes,
        PayloadKind::Nodes,
        SectionTag::Nodes,
        wire_limits,
        limits,
        decode_node,
    )
}

/// Encodes a way batch into a `Ways` payload.
pub fn encode_ways(ways: &[Way], limits: &CodecLimits) -> CodecResult<Vec<u8>> {
    encode_batch(
        PayloadKind::Ways,
        SectionTag::Ways,
        ways,
        limits,
        check_way_limits,
        encode_way,
    )
}

/// Decodes a `Ways` payload.
pub fn decode_ways(
    bytes: &[u8],
    wire_limits: &wire::Limits,
    limits: &CodecLimits,
) -> CodecResult<Vec<Way>> {
    decode_batch(
        bytes,
        PayloadKind::Ways,
        SectionTag::Ways,
        wire_limits,
        limits,
        decode_way,
    )
}

/// Encodes a relation batch into a `Relations` payload.
pub fn encode_relations(relations: &[Relation], limits: &CodecLimits) -> CodecResult<Vec<u8>> {
    encode_batch(
        PayloadKind::Relations,
        SectionTag::Relations,
        relations,
        limits,
        check_relation_limits,
        encode_relation,
    )
}

/// Decodes a `Relations` payload.
pub fn decode_relations(
    bytes: &[u8],
    wire_limits: &wire::Limits,
    limits: &CodecLimits,
) -> CodecResult<Vec<Relation>> {
    decode_batch(
        bytes,
        PayloadKind::Relations,
        SectionTag::Relations,
        wire_limits,
        limits,
        decode_relation,
    )
}

/// Encodes a whole document into an `Osm` payload sharing one string table.
pub fn encode_osm(osm: &Osm, limits: &CodecLimits) -> CodecResult<Vec<u8>> {
    let mut table = StringTable::new();
    let sections = encode_osm_sections(osm, &mut table, limits)?;
    let strings = table.len();
    let bytes = finish_payload(PayloadKind::Osm, table, &sections, limits)?;
    debug!(
        nodes = osm.nodes.len(),
        ways = osm.ways.len(),
        relations = osm.relations.len(),
        strings,
        bytes = bytes.len(),
        "encoded osm payload"
    );
    Ok(bytes)
}

/// Decodes an `Osm` payload.
pub fn decode_osm(bytes: &[u8], wire_limits: &wire::Limits, limits: &CodecLimits) -> CodecResult<Osm> {
    let payload = wire::decode_payload(bytes, wire_limits)?;
    expect_kind(&payload.header, PayloadKind::Osm)?;
    let mut allowed = vec![SectionTag::StringTable];
    allowed.extend(OSM_SECTIONS);
    let set = SectionSet::collect(&payload.sections, &allowed)?;
    let strings = decode_string_table(set.require(SectionTag::StringTable)?, limits)?;
    let osm = decode_osm_sections(&set, &strings, limits)?;
    debug!(
        nodes = osm.nodes.len(),
        ways = osm.ways.len(),
        relations = osm.relations.len(),
        strings = strings.len(),
        bytes = bytes.len(),
        "decoded osm payload"
    );
    Ok(osm)
}

/// Reads the element count at the start of an element section body.
pub fn section_element_count(section: &WireSection<'_>) -> CodecResult<usize> {
    let mut reader = BitReader::new(section.body);
    Ok(reader.read_varu32()? as usize)
}

/// Encodes the three element sections of `osm`, interning into `table`.
pub(crate) fn encode_osm_sections(
    osm: &Osm,
    table: &mut StringTable,
    limits: &CodecLimits,
) -> CodecResult<Vec<(SectionTag, Vec<u8>)>> {
    Ok(vec![
        (
            SectionTag::Nodes,
            encode_element_section(&osm.nodes, table, limits, check_node_limits, encode_node)?,
        ),
        (
            SectionTag::Ways,
            encode_element_section(&osm.ways, table, limits, check_way_limits, encode_way)?,
        ),
        (
            SectionTag::Relations,
            encode_element_section(
                &osm.relations,
                table,
                limits,
                check_relation_limits,
                encode_relation,
            )?,
        ),
    ])
}

/// Decodes the three required element sections of a document.
pub(crate) fn decode_osm_sections(
    set: &SectionSet<'_>,
    strings: &[String],
    limits: &CodecLimits,
) -> CodecResult<Osm> {
    Ok(Osm {
        nodes: decode_element_section(set.require(SectionTag::Nodes)?, strings, limits, decode_node)?,
        ways: decode_element_section(set.require(SectionTag::Ways)?, strings, limits, decode_way)?,
        relations: decode_element_section(
            set.require(SectionTag::Relations)?,
            strings,
            limits,
            decode_relation,
        )?,
    })
}

fn encode_batch<T>(
    kind: PayloadKind,
    tag: SectionTag,
    items: &[T],
    limits: &CodecLimits,
    check: impl Fn(&T, &CodecLimits) -> CodecResult<()>,
    encode: impl Fn(&T, Option<&T>, &mut StringTable, bool) -> CodecResult<Vec<u8>>,
) -> CodecResult<Vec<u8>> {
    let mut table = StringTable::new();
    let body = encode_element_section(items, &mut table, limits, check, encode)?;
    let strings = table.len();
    let bytes = finish_payload(kind, table, &[(tag, body)], limits)?;
    debug!(
        ?kind,
        elements = items.len(),
        strings,
        bytes = bytes.len(),
        "encoded batch"
    );
    Ok(bytes)
}

fn decode_batch<T>(
    bytes: &[u8],
    kind: PayloadKind,
    tag: SectionTag,
    wire_limits: &wire::Limits,
    limits: &CodecLimits,
    decode: impl Fn(&[u8], &[String], Option<&T>, &CodecLimits) -> CodecResult<T>,
) -> CodecResult<Vec<T>> {
    let payload = wire::decode_payload(bytes, wire_limits)?;
    expect_kind(&payload.header, kind)?;
    let set = SectionSet::collect(&payload.sections, &[SectionTag::StringTable, tag])?;
    let strings = decode_string_table(set.require(SectionTag::StringTable)?, limits)?;
    let items = decode_element_section(set.require(tag)?, &strings, limits, decode)?;
    debug!(
        ?kind,
        elements = items.len(),
        strings = strings.len(),
        bytes = bytes.len(),
        "decoded batch"
    );
    Ok(items)
}

fn encode_element_section<T>(
    items: &[T],
    table: &mut StringTable,
    limits: &CodecLimits,
    check: impl Fn(&T, &CodecLimits) -> CodecResult<()>,
    encode: impl Fn(&T, Option<&T>, &mut StringTable, bool) -> CodecResult<Vec<u8>>,
) -> CodecResult<Vec<u8>> {
    if items.len() > limits.max_elements {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::Elements,
            limit: limits.max_elements,
            actual: items.len(),
        });
    }

    let mut writer = BitWriter::new();
    writer.write_varu32(count_u32(items.len(), LimitKind::Elements)?)?;
    let mut previous = None;
    for item in items {
        check(item, limits)?;
        let fragment = encode(item, previous, table, true)?;
        writer.write_varu32(count_u32(fragment.len(), LimitKind::SectionBytes)?)?;
        writer.write_bytes_aligned(&fragment)?;
        previous = Some(item);
    }
    let body = writer.finish();
    check_section_len(body.len(), limits)?;
    Ok(body)
}

fn decode_element_section<T>(
    body: &[u8],
    strings: &[String],
    limits: &CodecLimits,
    decode: impl Fn(&[u8], &[String], Option<&T>, &CodecLimits) -> CodecResult<T>,
) -> CodecResult<Vec<T>> {
    check_section_len(body.len(), limits)?;
    let mut reader = BitReader::new(body);
    let count = read_count(&mut reader, LimitKind::Elements, limits.max_elements)?;
    let mut items: Vec<T> = Vec::with_capacity(count.min(body.len()));
    for _ in 0..count {
        let len = reader.read_varu32()? as usize;
        check_section_len(len, limits)?;
        let fragment = reader.read_bytes_aligned(len)?;
        let item = decode(fragment, strings, items.last(), limits)?;
        items.push(item);
    }
    ensure_consumed(&reader)?;
    Ok(items)
}
