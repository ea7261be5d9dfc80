//! Relation codec.

use bitstream::{BitReader, BitWriter};
use model::{ElementKind, Member, MemberType, Relation, RelationId};

use crate::error::{CodecError, CodecResult, IndexKind, LimitKind};
use crate::info::{
    capacity_hint, check_count, check_tags, read_count, read_delta, read_info, read_tags, write_delta,
    write_info, write_tags, Info, InfoBase,
};
use crate::limits::CodecLimits;
use crate::minor::{check_minors, read_minors, write_minors};
use crate::strings::{count_u32, ensure_consumed, resolve, StringTable};

/// Encodes one relation, including its minor versions, into a standalone
/// fragment.
///
/// Each member is stored as a type byte, a reference delta-encoded against the
/// previous member's reference, and an interned role.
pub fn encode_relation(
    relation: &Relation,
    previous: Option<&Relation>,
    table: &mut StringTable,
    include_tags: bool,
) -> CodecResult<Vec<u8>> {
    let mut writer = BitWriter::new();
    write_relation(&mut writer, relation, previous, table, include_tags)?;
    Ok(writer.finish())
}

/// Decodes a fragment produced by [`encode_relation`].
pub fn decode_relation(
    fragment: &[u8],
    strings: &[String],
    previous: Option<&Relation>,
    limits: &CodecLimits,
) -> CodecResult<Relation> {
    let mut reader = BitReader::new(fragment);
    let relation = read_relation(&mut reader, strings, previous, limits)?;
    ensure_consumed(&reader)?;
    Ok(relation)
}

/// Checks `relation` and its minors against the limits [`decode_relation`]
/// enforces.
pub(crate) fn check_relation_limits(relation: &Relation, limits: &CodecLimits) -> CodecResult<()> {
    check_count(
        LimitKind::MembersPerElement,
        limits.max_members_per_element,
        relation.members.len(),
    )?;
    check_tags(relation.tags.as_ref(), limits)?;
    check_minors(relation.minors.as_deref(), limits)
}

fn write_relation(
    writer: &mut BitWriter,
    relation: &Relation,
    previous: Option<&Relation>,
    table: &mut StringTable,
    include_tags: bool,
) -> CodecResult<()> {
    let tags = relation.tags.as_ref().filter(|_| include_tags);

    writer.write_bit(relation.visible);
    writer.write_bit(tags.is_some());
    writer.write_bit(relation.minors.is_some());
    writer.align_to_byte();

    let (base_id, base) = bases(previous);
    write_delta(writer, relation.id.raw(), base_id)?;
    let info = info(relation);
    write_info(writer, &info, base, table)?;
    write_members(writer, &relation.members, table)?;

    if let Some(tags) = tags {
        write_tags(writer, tags, table)?;
    }
    if let Some(minors) = &relation.minors {
        write_minors(writer, minors, info.base(), table, write_members)?;
    }
    Ok(())
}

fn read_relation(
    reader: &mut BitReader<'_>,
    strings: &[String],
    previous: Option<&Relation>,
    limits: &CodecLimits,
) -> CodecResult<Relation> {
    let visible = reader.read_bit()?;
    let has_tags = reader.read_bit()?;
    let has_minors = reader.read_bit()?;
    reader.align_to_byte()?;

    let (base_id, base) = bases(previous);
    let id = read_delta(reader, base_id)?;
    let info = read_info(reader, strings, base)?;
    let members = read_members(reader, strings, limits)?;

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
            ElementKind::Relation,
            id,
            read_members,
        )?)
    } else {
        None
    };

    Ok(Relation {
        id: RelationId::new(id),
        version: info.version,
        changeset: info.changeset,
        timestamp: info.timestamp,
        user_id: info.user_id,
        user: info.user,
        visible,
        members,
        tags,
        minors,
    })
}

fn info(relation: &Relation) -> Info<&str> {
    Info {
        version: relation.version,
        changeset: relation.changeset,
        timestamp: relation.timestamp,
        user_id: relation.user_id,
        user: &relation.user,
    }
}

fn bases(previous: Option<&Relation>) -> (i64, InfoBase) {
    previous.map_or((0, InfoBase::default()), |relation| {
        (relation.id.raw(), info(relation).base())
    })
}

const fn member_type_code(kind: MemberType) -> u8 {
    match kind {
        MemberType::Node => 0,
        MemberType::Way => 1,
        MemberType::Relation => 2,
    }
}

fn member_type_from_code(code: u8) -> CodecResult<MemberType> {
    match code {
        0 => Ok(MemberType::Node),
        1 => Ok(MemberType::Way),
        2 => Ok(MemberType::Relation),
        _ => Err(CodecError::OutOfRangeIndex {
            kind: IndexKind::MemberType,
            index: u64::from(code),
            len: 3,
        }),
    }
}

fn write_members(writer: &mut BitWriter, members: &[Member], table: &mut StringTable) -> CodecResult<()> {
    writer.write_varu32(count_u32(members.len(), LimitKind::MembersPerElement)?)?;
    let mut last = 0;
    for member in members {
        writer.write_u8_aligned(member_type_code(member.kind))?;
        write_delta(writer, member.id, last)?;
        writer.write_varu32(table.intern(&member.role))?;
        last = member.id;
    }
    Ok(())
}

fn read_members(
    reader: &mut BitReader<'_>,
    strings: &[String],
    limits: &CodecLimits,
) -> CodecResult<Vec<Member>> {
    let count = read_count(reader, LimitKind::MembersPerElement, limits.max_members_per_element)?;
    let mut members = Vec::with_capacity(capacity_hint(count, reader));
    let mut last = 0;
    for _ in 0..count {
        let kind = member_type_from_code(reader.read_u8_aligned()?)?;
        last = read_delta(reader, last)?;
        let role = resolve(reader.read_varu32()?, strings)?;
        members.push(Member::new(kind, last, role));
    }
    Ok(members)
}
