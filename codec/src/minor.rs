//! Minor-version delta codec shared by ways and relations.
//!
//! A group is a count followed by one record per minor. Each record starts
//! with three flag bits (repeat, has members, has tags), then version and
//! authorship delta-encoded against the preceding minor (the element itself
//! for the first one). A minor whose member list equals its predecessor's sets
//! the repeat flag and stores no members; decoding carries the predecessor's
//! list forward.

use bitstream::{BitReader, BitWriter};
use model::{ElementKind, Minor};

use crate::error::{CodecError, CodecResult, DeltaReason, LimitKind};
use crate::info::{
    check_count, check_tags, read_count, read_info, read_tags, write_info, write_tags, Info, InfoBase,
};
use crate::limits::CodecLimits;
use crate::strings::{count_u32, StringTable};

/// Checks a minor group against the limits its decoder enforces.
pub(crate) fn check_minors<M>(minors: Option<&[Minor<M>]>, limits: &CodecLimits) -> CodecResult<()> {
    let Some(minors) = minors else {
        return Ok(());
    };
    check_count(
        LimitKind::MinorsPerElement,
        limits.max_minors_per_element,
        minors.len(),
    )?;
    for minor in minors {
        check_tags(minor.tags.as_ref(), limits)?;
        let members = minor.members.as_ref().map_or(0, Vec::len);
        check_count(
            LimitKind::MembersPerElement,
            limits.max_members_per_element,
            members,
        )?;
    }
    Ok(())
}

pub(crate) fn write_minors<M: PartialEq>(
    writer: &mut BitWriter,
    minors: &[Minor<M>],
    element_base: InfoBase,
    table: &mut StringTable,
    mut write_members: impl FnMut(&mut BitWriter, &[M], &mut StringTable) -> CodecResult<()>,
) -> CodecResult<()> {
    writer.write_varu32(count_u32(minors.len(), LimitKind::MinorsPerElement)?)?;

    let mut previous: Option<&Minor<M>> = None;
    for minor in minors {
        let repeat = previous.is_some_and(|prev| {
            minor.members.is_some() && prev.members == minor.members
        });

        writer.write_bit(repeat);
        writer.write_bit(minor.members.is_some());
        writer.write_bit(minor.tags.is_some());
        writer.align_to_byte();

        let base = previous.map_or(element_base, |prev| info(prev).base());
        write_info(writer, &info(minor), base, table)?;

        if let Some(tags) = &minor.tags {
            write_tags(writer, tags, table)?;
        }
        if let (false, Some(members)) = (repeat, &minor.members) {
            write_members(writer, members, table)?;
        }
        previous = Some(minor);
    }
    Ok(())
}

pub(crate) fn read_minors<M: Clone>(
    reader: &mut BitReader<'_>,
    strings: &[String],
    element_base: InfoBase,
    limits: &CodecLimits,
    kind: ElementKind,
    id: i64,
    mut read_members: impl FnMut(&mut BitReader<'_>, &[String], &CodecLimits) -> CodecResult<Vec<M>>,
) -> CodecResult<Vec<Minor<M>>> {
    let count = read_count(reader, LimitKind::MinorsPerElement, limits.max_minors_per_element)?;
    let mut minors: Vec<Minor<M>> = Vec::with_capacity(count.min(reader.bits_remaining() / 8));

    for index in 0..count {
        let repeat = reader.read_bit()?;
        let has_members = reader.read_bit()?;
        let has_tags = reader.read_bit()?;
        reader.align_to_byte()?;

        let malformed = |reason| CodecError::MalformedDelta {
            kind,
            id,
            minor: index,
            reason,
        };

        let previous = minors.last();
        let base = previous.map_or(element_base, |prev| info(prev).base());
        let decoded = read_info(reader, strings, base)?;

        let tags = if has_tags {
            Some(read_tags(reader, strings, limits)?)
        } else {
            None
        };

        let members = match (repeat, has_members) {
            (true, false) => return Err(malformed(DeltaReason::RepeatWithoutMembers)),
            (true, true) => {
                let previous = previous.ok_or_else(|| malformed(DeltaReason::NoPredecessor))?;
                let members = previous
                    .members
                    .clone()
                    .ok_or_else(|| malformed(DeltaReason::PredecessorWithoutMembers))?;
                Some(members)
            }
            (false, true) => Some(read_members(reader, strings, limits)?),
            (false, false) => None,
        };

        minors.push(Minor {
            version: decoded.version,
            changeset: decoded.changeset,
            timestamp: decoded.timestamp,
            user_id: decoded.user_id,
            user: decoded.user,
            tags,
            members,
        });
    }
    Ok(minors)
}

fn info<M>(minor: &Minor<M>) -> Info<&str> {
    Info {
        version: minor.version,
        changeset: minor.changeset,
        timestamp: minor.timestamp,
        user_id: minor.user_id,
        user: &minor.user,
    }
}
