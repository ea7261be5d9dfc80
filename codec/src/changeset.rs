//! Changeset payloads.
//!
//! A changeset payload carries the author identity in a `ChangesetInfo`
//! section and one nested section sequence per present change group. All
//! groups intern into the same string table.

use bitstream::{BitReader, BitWriter};
use model::{Change, Changeset, ChangesetId, Osm, UserId};
use tracing::debug;
use wire::{PayloadKind, SectionTag};

use crate::batch::{decode_osm_sections, encode_osm_sections};
use crate::error::CodecResult;
use crate::limits::CodecLimits;
use crate::sections::{check_section_len, expect_kind, finish_payload, write_sections, SectionSet};
use crate::strings::{decode_string_table, ensure_consumed, resolve, StringTable};

const CHANGESET_SECTIONS: [SectionTag; 5] = [
    SectionTag::StringTable,
    SectionTag::ChangesetInfo,
    SectionTag::Create,
    SectionTag::Modify,
    SectionTag::Delete,
];

const GROUP_SECTIONS: [SectionTag; 3] = [SectionTag::Nodes, SectionTag::Ways, SectionTag::Relations];

/// Encodes a changeset into a `Changeset` payload.
///
/// Absent change groups produce no section; a present but empty group is
/// kept and decodes as an empty document.
pub fn encode_changeset(changeset: &Changeset, limits: &CodecLimits) -> CodecResult<Vec<u8>> {
    let mut table = StringTable::new();
    let mut sections = vec![(
        SectionTag::ChangesetInfo,
        encode_info(changeset, &mut table)?,
    )];

    let change = &changeset.change;
    for (tag, group) in [
        (SectionTag::Create, &change.create),
        (SectionTag::Modify, &change.modify),
        (SectionTag::Delete, &change.delete),
    ] {
        if let Some(osm) = group {
            sections.push((tag, encode_group(osm, &mut table, limits)?));
        }
    }

    let strings = table.len();
    let bytes = finish_payload(PayloadKind::Changeset, table, &sections, limits)?;
    debug!(
        id = changeset.id.raw(),
        groups = sections.len() - 1,
        strings,
        bytes = bytes.len(),
        "encoded changeset"
    );
    Ok(bytes)
}

/// Decodes a `Changeset` payload.
pub fn decode_changeset(
    bytes: &[u8],
    wire_limits: &wire::Limits,
    limits: &CodecLimits,
) -> CodecResult<Changeset> {
    let payload = wire::decode_payload(bytes, wire_limits)?;
    expect_kind(&payload.header, PayloadKind::Changeset)?;
    let set = SectionSet::collect(&payload.sections, &CHANGESET_SECTIONS)?;
    let strings = decode_string_table(set.require(SectionTag::StringTable)?, limits)?;

    let mut changeset = decode_info(set.require(SectionTag::ChangesetInfo)?, &strings)?;
    let group = |tag| {
        set.get(tag)
            .map(|body| decode_group(body, &strings, wire_limits, limits))
            .transpose()
    };
    changeset.change = Change {
        create: group(SectionTag::Create)?,
        modify: group(SectionTag::Modify)?,
        delete: group(SectionTag::Delete)?,
    };

    debug!(
        id = changeset.id.raw(),
        groups = changeset.change.groups().count(),
        strings = strings.len(),
        bytes = bytes.len(),
        "decoded changeset"
    );
    Ok(changeset)
}

fn encode_info(changeset: &Changeset, table: &mut StringTable) -> CodecResult<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(24);
    writer.write_vars64(changeset.id.raw())?;
    writer.write_vars64(changeset.user_id.raw())?;
    writer.write_varu32(table.intern(&changeset.user))?;
    Ok(writer.finish())
}

fn decode_info(body: &[u8], strings: &[String]) -> CodecResult<Changeset> {
    let mut reader = BitReader::new(body);
    let id = reader.read_vars64()?;
    let user_id = reader.read_vars64()?;
    let user = resolve(reader.read_varu32()?, strings)?.to_owned();
    ensure_consumed(&reader)?;
    Ok(Changeset {
        id: ChangesetId::new(id),
        user_id: UserId::new(user_id),
        user,
        change: Change::default(),
    })
}

fn encode_group(osm: &Osm, table: &mut StringTable, limits: &CodecLimits) -> CodecResult<Vec<u8>> {
    let sections = encode_osm_sections(osm, table, limits)?;
    let mut body = Vec::new();
    write_sections(&sections, &mut body)?;
    check_section_len(body.len(), limits)?;
    Ok(body)
}

fn decode_group(
    body: &[u8],
    strings: &[String],
    wire_limits: &wire::Limits,
    limits: &CodecLimits,
) -> CodecResult<Osm> {
    check_section_len(body.len(), limits)?;
    let sections = wire::decode_sections(body, wire_limits)?;
    let set = SectionSet::collect(&sections, &GROUP_SECTIONS)?;
    decode_osm_sections(&set, strings, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use model::{Coordinates, Node, NodeId, Way, WayId};

    fn sample() -> Changeset {
        let node = Node {
            id: NodeId::new(-1),
            version: 1,
            user: "alice".to_owned(),
            visible: true,
            coords: Some(Coordinates::new(10.0, 20.0)),
            ..Node::default()
        };
        let way = Way {
            id: WayId::new(7),
            version: 4,
            user: "alice".to_owned(),
            visible: true,
            nodes: vec![NodeId::new(-1), NodeId::new(3)],
            ..Way::default()
        };
        Changeset {
            id: ChangesetId::new(42),
            user_id: UserId::new(9),
            user: "alice".to_owned(),
            change: Change {
                create: Some(Osm {
                    nodes: vec![node],
                    ..Osm::default()
                }),
                modify: Some(Osm {
                    ways: vec![way],
                    ..Osm::default()
                }),
                delete: None,
            },
        }
    }

    #[test]
    fn changeset_round_trips() {
        let changeset = sample();
        let limits = CodecLimits::for_testing();
        let bytes = encode_changeset(&changeset, &limits).unwrap();
        let decoded = decode_changeset(&bytes, &wire::Limits::for_testing(), &limits).unwrap();
        assert_eq!(decoded, changeset);
    }

    #[test]
    fn absent_and_empty_groups_stay_distinct() {
        let mut changeset = sample();
        changeset.change.delete = Some(Osm::default());
        let limits = CodecLimits::for_testing();
        let bytes = encode_changeset(&changeset, &limits).unwrap();
        let decoded = decode_changeset(&bytes, &wire::Limits::for_testing(), &limits).unwrap();
        assert_eq!(decoded.change.delete, Some(Osm::default()));

        changeset.change = Change::default();
        let bytes = encode_changeset(&changeset, &limits).unwrap();
        let decoded = decode_changeset(&bytes, &wire::Limits::for_testing(), &limits).unwrap();
        assert_eq!(decoded.change, Change::default());
    }

    #[test]
    fn user_name_is_shared_with_elements() {
        let limits = CodecLimits::for_testing();
        let bytes = encode_changeset(&sample(), &limits).unwrap();
        let payload = wire::decode_payload(&bytes, &wire::Limits::for_testing()).unwrap();
        let table = decode_string_table(payload.sections[0].body, &limits).unwrap();
        assert_eq!(table, vec!["alice"]);
    }

    #[test]
    fn missing_info_section_is_rejected() {
        let mut payload = Vec::new();
        wire::encode_section(SectionTag::StringTable, &[0], &mut payload).unwrap();
        let bytes = wire::encode_payload(PayloadKind::Changeset, &payload).unwrap();
        let err = decode_changeset(&bytes, &wire::Limits::for_testing(), &CodecLimits::for_testing())
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::MissingSection {
                section: SectionTag::ChangesetInfo
            }
        );
    }

    #[test]
    fn group_with_foreign_section_is_rejected() {
        let mut group = Vec::new();
        wire::encode_section(SectionTag::StringTable, &[0], &mut group).unwrap();
        let mut info = BitWriter::new();
        info.write_vars64(1).unwrap();
        info.write_vars64(2).unwrap();
        info.write_varu32(0).unwrap();
        let info = info.finish();

        let mut payload = Vec::new();
        wire::encode_section(SectionTag::StringTable, &[1, 1, b'x'], &mut payload).unwrap();
        wire::encode_section(SectionTag::ChangesetInfo, &info, &mut payload).unwrap();
        wire::encode_section(SectionTag::Create, &group, &mut payload).unwrap();
        let bytes = wire::encode_payload(PayloadKind::Changeset, &payload).unwrap();
        let err = decode_changeset(&bytes, &wire::Limits::for_testing(), &CodecLimits::for_testing())
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedSection {
                section: SectionTag::StringTable
            }
        );
    }

    #[test]
    fn rejects_osm_payload() {
        let limits = CodecLimits::for_testing();
        let bytes = crate::batch::encode_osm(&Osm::default(), &limits).unwrap();
        let err = decode_changeset(&bytes, &wire::Limits::for_testing(), &limits).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedPayloadKind { .. }));
    }
}
