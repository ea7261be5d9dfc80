//! Node codec.

use bitstream::{BitReader, BitWriter};
use model::{Coordinates, ElementKind, Node, NodeId};

use crate::coords::{from_fixed, lat_to_fixed, lon_to_fixed};
use crate::error::{CodecError, CodecResult, SchemaReason};
use crate::info::{
    check_tags, read_delta, read_info, read_tags, write_delta, write_info, write_tags, Info, InfoBase,
};
use crate::limits::CodecLimits;
use crate::strings::{ensure_consumed, StringTable};

/// Encodes one node into a standalone fragment.
///
/// Identity fields and coordinates are delta-encoded against `previous`, or
/// against zero when there is none. With `include_tags` false the tags are
/// left out and the node decodes with absent tags.
pub fn encode_node(
    node: &Node,
    previous: Option<&Node>,
    table: &mut StringTable,
    include_tags: bool,
) -> CodecResult<Vec<u8>> {
    let mut writer = BitWriter::new();
    write_node(&mut writer, node, previous, table, include_tags)?;
    Ok(writer.finish())
}

/// Decodes a fragment produced by [`encode_node`].
///
/// `previous` must be the node the fragment was encoded against.
pub fn decode_node(
    fragment: &[u8],
    strings: &[String],
    previous: Option<&Node>,
    limits: &CodecLimits,
) -> CodecResult<Node> {
    let mut reader = BitReader::new(fragment);
    let node = read_node(&mut reader, strings, previous, limits)?;
    ensure_consumed(&reader)?;
    Ok(node)
}

/// Checks `node` against the limits [`decode_node`] enforces.
pub(crate) fn check_node_limits(node: &Node, limits: &CodecLimits) -> CodecResult<()> {
    check_tags(node.tags.as_ref(), limits)
}

fn write_node(
    writer: &mut BitWriter,
    node: &Node,
    previous: Option<&Node>,
    table: &mut StringTable,
    include_tags: bool,
) -> CodecResult<()> {
    let fixed = match node.coords {
        Some(coords) => Some(fixed_coords(node, coords)?),
        None if node.visible => {
            return Err(CodecError::SchemaMismatch {
                kind: ElementKind::Node,
                id: node.id.raw(),
                reason: SchemaReason::MissingCoordinates,
            })
        }
        None => None,
    };
    let tags = node.tags.as_ref().filter(|_| include_tags);

    writer.write_bit(node.visible);
    writer.write_bit(fixed.is_some());
    writer.write_bit(tags.is_some());
    writer.align_to_byte();

    let (base_id, base) = bases(previous);
    write_delta(writer, node.id.raw(), base_id)?;
    write_info(writer, &info(node), base, table)?;

    if let Some((lat, lon)) = fixed {
        let (base_lat, base_lon) = previous_fixed(previous);
        write_delta(writer, lat, base_lat)?;
        write_delta(writer, lon, base_lon)?;
    }
    if let Some(tags) = tags {
        write_tags(writer, tags, table)?;
    }
    Ok(())
}

fn read_node(
    reader: &mut BitReader<'_>,
    strings: &[String],
    previous: Option<&Node>,
    limits: &CodecLimits,
) -> CodecResult<Node> {
    let visible = reader.read_bit()?;
    let has_coords = reader.read_bit()?;
    let has_tags = reader.read_bit()?;
    reader.align_to_byte()?;

    let (base_id, base) = bases(previous);
    let id = read_delta(reader, base_id)?;
    let info = read_info(reader, strings, base)?;

    let coords = if has_coords {
        let (base_lat, base_lon) = previous_fixed(previous);
        let lat = read_delta(reader, base_lat)?;
        let lon = read_delta(reader, base_lon)?;
        Some(Coordinates::new(from_fixed(lat), from_fixed(lon)))
    } else if visible {
        return Err(CodecError::SchemaMismatch {
            kind: ElementKind::Node,
            id,
            reason: SchemaReason::MissingCoordinates,
        });
    } else {
        None
    };

    let tags = if has_tags {
        Some(read_tags(reader, strings, limits)?)
    } else {
        None
    };

    Ok(Node {
        id: NodeId::new(id),
        version: info.version,
        changeset: info.changeset,
        timestamp: info.timestamp,
        user_id: info.user_id,
        user: info.user,
        visible,
        coords,
        tags,
    })
}

fn info(node: &Node) -> Info<&str> {
    Info {
        version: node.version,
        changeset: node.changeset,
        timestamp: node.timestamp,
        user_id: node.user_id,
        user: &node.user,
    }
}

fn bases(previous: Option<&Node>) -> (i64, InfoBase) {
    previous.map_or((0, InfoBase::default()), |node| (node.id.raw(), info(node).base()))
}

fn fixed_coords(node: &Node, coords: Coordinates) -> CodecResult<(i64, i64)> {
    lat_to_fixed(coords.lat)
        .zip(lon_to_fixed(coords.lon))
        .ok_or(CodecError::SchemaMismatch {
            kind: ElementKind::Node,
            id: node.id.raw(),
            reason: SchemaReason::CoordinateOutOfRange,
        })
}

/// Fixed-point coordinates of the previous node, or zero.
///
/// Encoded coordinates always passed the range check, so decoded previous
/// nodes convert back to the same fixed values.
fn previous_fixed(previous: Option<&Node>) -> (i64, i64) {
    previous
        .and_then(|node| node.coords)
        .and_then(|coords| lat_to_fixed(coords.lat).zip(lon_to_fixed(coords.lon)))
        .unwrap_or((0, 0))
}
