//! Way codec.

use bitstream::{BitReader, BitWriter};
use model::{ElementKind, NodeId, Way, WayId};

use crate::error::{CodecResult, LimitKind};
use crate::info::{
    capacity_hint, check_count, check_tags, read_count, read_delta, read_info, read_tags, write_delta,
    write_info, write_tags, Info, InfoBase,
};
use crate::limits::CodecLimits;
use crate::minor::{check_minors, read_minors, write_minors};
use crate::strings::{count_u32, ensure_consumed, StringTable};

/// Encodes one way, including its minor versions, into a standalone fragment.
///
/// Node references are delta-encoded along the list. Identity fields are
/// delta-encoded against `previous`, or against zero when there is none.
pub fn encode_way(
    way: &Way,
    previous: Option<&Way>,
    table: &mut StringTable,
    include_tags: bool,
) -> CodecResult<Vec<u8>> {
    let mut writer = BitWriter::new();
    write_way(&mut writer, way, previous, table, include_tags)?;
    Ok(writer.finish())
}

/// Decodes a fragment produced by [`encode_way`].
pub fn decode_way(
    fragment: &[u8],
    strings: &[String],
    previous: Option<&Way>,
    limits: &CodecLimits,
) -> CodecResult<Way> {
    let mut reader = BitReader::new(fragment);
    let way = read_way(&mut reader, strings, previous, limits)?;
    ensure_consumed(&reader)?;
    Ok(way)
}

/// Checks `way` and its minors against the limits [`decode_way`] enforces.
pub(crate) fn check_way_limits(way: &Way, limits: &CodecLimits) -> CodecResult<()> {
    check_count(
        LimitKind::MembersPerElement,
        limits.max_members_per_element,
        way.nodes.len(),
    )?;
    check_tags(way.tags.as_ref(), limits)?;
    check_minors(way.minors.as_deref(), limits)
}

fn write_way(
    writer: &mut BitWriter,
    way: &Way,
    previous: Option<&Way>,
    table: &mut StringTable,
    include_tags: bool,
) -> CodecResult<()> {
    let tags = way.tags.as_ref().filter(|_| include_tags);

    writer.write_bit(way.visible);
    writer.write_bit(tags.is_some());
    writer.write_bit(way.minors.is_some());
    writer.align_to_byte();

    let (base_id, base) = bases(previous);
    write_delta(writer, way.id.raw(), base_id)?;
    let info = info(way);
    write_info(writer, &info, base, table)?;
    write_node_refs(writer, &way.nodes, table)?;

    if let Some(tags) = tags {
        write_tags(writer, tags, table)?;
    }
    if let Some(minors) = &way.minors {
        write_minors(writer, minors, info.base(), table, write_node_refs)?;
    }
    Ok(())
}

fn read_way(
    reader: &mut BitReader<'_>,
    strings: &[String],
    previous: Option<&Way>,
    limits: &CodecLimits,
) -> CodecResult<Way> {
    let visible = reader.read_bit()?;
    let has_tags = reader.read_bit()?;
    let has_minors = reader.read_bit()?;
    reader.align_to_byte()?;

    let (base_id, base) = bases(previous);
    let id = read_delta(reader, base_id)?;
    let info = read_info(reader, strings, base)?;
    let nodes = read_node_refs(reader, strings, limits)?;

    let tags = if has_tags {
        Some(read_tags(reader, strings, limits)?)
    } else {
        None
    };
    let minors = if has_minors {
        Some(read_minors(
            reader,
            strings,
            info.base(),
            limits,
            ElementKind::Way,
            id,
            read_node_refs,
        )?)
    } else {
        None
    };

    Ok(Way {
        id: WayId::new(id),
        version: info.version,
        changeset: info.changeset,
        timestamp: info.timestamp,
        user_id: info.user_id,
        user: info.user,
        visible,
        nodes,
        tags,
        minors,
    })
}

fn info(way: &Way) -> Info<&str> {
    Info {
        version: way.version,
        changeset: way.changeset,
        timestamp: way.timestamp,
        user_id: way.user_id,
        user: &way.user,
    }
}

fn bases(previous: Option<&Way>) -> (i64, InfoBase) {
    previous.map_or((0, InfoBase::default()), |way| (way.id.raw(), info(way).base()))
}

/// Writes a node reference list, each id delta-encoded against the one before.
fn write_node_refs(writer: &mut BitWriter, nodes: &[NodeId], _: &mut StringTable) -> CodecResult<()> {
    writer.write_varu32(count_u32(nodes.len(), LimitKind::MembersPerElement)?)?;
    let mut last = 0;
    for node in nodes {
        write_delta(writer, node.raw(), last)?;
        last = node.raw();
    }
    Ok(())
}

fn read_node_refs(
    reader: &mut BitReader<'_>,
    _: &[String],
    limits: &CodecLimits,
) -> CodecResult<Vec<NodeId>> {
    let count = read_count(reader, LimitKind::MembersPerElement, limits.max_members_per_element)?;
    let mut nodes = Vec::with_capacity(capacity_hint(count, reader));
    let mut last = 0;
    for _ in 0..count {
        last = read_delta(reader, last)?;
        nodes.push(NodeId::new(last));
    }
    Ok(nodes)
}
