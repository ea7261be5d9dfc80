//! Fields shared by every element and minor version: version, changeset,
//! timestamp and author, plus tag lists.

use bitstream::{BitReader, BitWriter};
use model::{ChangesetId, Tags, Timestamp, UserId};

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;
use crate::strings::{count_u32, resolve, StringTable};

/// Values the numeric info fields are delta-encoded against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct InfoBase {
    pub changeset: i64,
    pub timestamp: i64,
    pub user_id: i64,
}

/// Version and authorship of an element or minor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Info<S> {
    pub version: u32,
    pub changeset: ChangesetId,
    pub timestamp: Timestamp,
    pub user_id: UserId,
    pub user: S,
}

impl<S> Info<S> {
    pub const fn base(&self) -> InfoBase {
        InfoBase {
            changeset: self.changeset.raw(),
            timestamp: self.timestamp.raw(),
            user_id: self.user_id.raw(),
        }
    }
}

pub(crate) fn write_info(
    writer: &mut BitWriter,
    info: &Info<&str>,
    base: InfoBase,
    table: &mut StringTable,
) -> CodecResult<()> {
    writer.write_varu32(info.version)?;
    write_delta(writer, info.changeset.raw(), base.changeset)?;
    write_delta(writer, info.timestamp.raw(), base.timestamp)?;
    write_delta(writer, info.user_id.raw(), base.user_id)?;
    writer.write_varu32(table.intern(info.user))?;
    Ok(())
}

pub(crate) fn read_info(
    reader: &mut BitReader<'_>,
    strings: &[String],
    base: InfoBase,
) -> CodecResult<Info<String>> {
    let version = reader.read_varu32()?;
    let changeset = read_delta(reader, base.changeset)?;
    let timestamp = read_delta(reader, base.timestamp)?;
    let user_id = read_delta(reader, base.user_id)?;
    let user = resolve(reader.read_varu32()?, strings)?.to_owned();
    Ok(Info {
        version,
        changeset: ChangesetId::new(changeset),
        timestamp: Timestamp::new(timestamp),
        user_id: UserId::new(user_id),
        user,
    })
}

/// Writes `value - base` as a zigzag varint.
pub(crate) fn write_delta(writer: &mut BitWriter, value: i64, base: i64) -> CodecResult<()> {
    writer.write_vars64(value.wrapping_sub(base))?;
    Ok(())
}

pub(crate) fn read_delta(reader: &mut BitReader<'_>, base: i64) -> CodecResult<i64> {
    Ok(base.wrapping_add(reader.read_vars64()?))
}

/// Writes a tag list as a count followed by key/value string indices.
pub(crate) fn write_tags(writer: &mut BitWriter, tags: &Tags, table: &mut StringTable) -> CodecResult<()> {
    writer.write_varu32(count_u32(tags.len(), LimitKind::TagsPerElement)?)?;
    for (key, value) in tags {
        writer.write_varu32(table.intern(key))?;
        writer.write_varu32(table.intern(value))?;
    }
    Ok(())
}

pub(crate) fn read_tags(
    reader: &mut BitReader<'_>,
    strings: &[String],
    limits: &CodecLimits,
) -> CodecResult<Tags> {
    let count = read_count(reader, LimitKind::TagsPerElement, limits.max_tags_per_element)?;
    let mut tags = Tags::new();
    for _ in 0..count {
        let key = resolve(reader.read_varu32()?, strings)?;
        let value = resolve(reader.read_varu32()?, strings)?;
        if tags.insert(key, value).is_some() {
            return Err(CodecError::DuplicateTagKey {
                key: key.to_owned(),
            });
        }
    }
    Ok(tags)
}

/// Checks the tag count of an element or minor before it is encoded.
pub(crate) fn check_tags(tags: Option<&Tags>, limits: &CodecLimits) -> CodecResult<()> {
    let count = tags.map_or(0, Tags::len);
    check_count(LimitKind::TagsPerElement, limits.max_tags_per_element, count)
}

pub(crate) fn check_count(kind: LimitKind, limit: usize, actual: usize) -> CodecResult<()> {
    if actual > limit {
        return Err(CodecError::LimitsExceeded {
            kind,
            limit,
            actual,
        });
    }
    Ok(())
}

/// Reads a list length and checks it against `limit`.
pub(crate) fn read_count(reader: &mut BitReader<'_>, kind: LimitKind, limit: usize) -> CodecResult<usize> {
    let count = reader.read_varu32()? as usize;
    check_count(kind, limit, count)?;
    Ok(count)
}

/// Capacity hint for a list of `count` entries of at least one byte each.
pub(crate) fn capacity_hint(count: usize, reader: &BitReader<'_>) -> usize {
    count.min(reader.bits_remaining() / 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> Info<&'static str> {
        Info {
            version: 3,
            changeset: ChangesetId::new(38_162_210),
            timestamp: Timestamp::new(1_456_000_000),
            user_id: UserId::new(2_744_209),
            user: "grah735",
        }
    }

    #[test]
    fn info_roundtrip_against_zero_base() {
        let info = sample_info();
        let mut table = StringTable::new();
        let mut writer = BitWriter::new();
        write_info(&mut writer, &info, InfoBase::default(), &mut table).unwrap();
        let bytes = writer.finish();

        let strings = table.finalize();
        let mut reader = BitReader::new(&bytes);
        let decoded = read_info(&mut reader, &strings, InfoBase::default()).unwrap();
        assert_eq!(decoded.version, 3);
        assert_eq!(decoded.changeset, info.changeset);
        assert_eq!(decoded.timestamp, info.timestamp);
        assert_eq!(decoded.user_id, info.user_id);
        assert_eq!(decoded.user, "grah735");
        assert!(reader.is_empty());
    }

    #[test]
    fn info_delta_against_own_base_is_small() {
        let info = sample_info();
        let mut table = StringTable::new();
        let mut writer = BitWriter::new();
        write_info(&mut writer, &info, info.base(), &mut table).unwrap();
        // version + three zero deltas + user index
        assert_eq!(writer.finish().len(), 5);
    }

    #[test]
    fn delta_wraps_at_extremes() {
        let mut writer = BitWriter::new();
        write_delta(&mut writer, i64::MIN, i64::MAX).unwrap();
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(read_delta(&mut reader, i64::MAX).unwrap(), i64::MIN);
    }

    #[test]
    fn tags_roundtrip() {
        let tags: Tags = [("highway", "residential"), ("name", "Main")].into_iter().collect();
        let mut table = StringTable::new();
        let mut writer = BitWriter::new();
        write_tags(&mut writer, &tags, &mut table).unwrap();
        let bytes = writer.finish();

        let strings = table.finalize();
        let mut reader = BitReader::new(&bytes);
        let decoded = read_tags(&mut reader, &strings, &CodecLimits::for_testing()).unwrap();
        assert_eq!(decoded, tags);
    }

    #[test]
    fn read_tags_rejects_duplicate_keys() {
        let strings = vec!["k".to_string(), "v".to_string()];
        let bytes = [2, 0, 1, 0, 1];
        let mut reader = BitReader::new(&bytes);
        let err = read_tags(&mut reader, &strings, &CodecLimits::for_testing()).unwrap_err();
        assert_eq!(
            err,
            CodecError::DuplicateTagKey {
                key: "k".to_string()
            }
        );
    }

    #[test]
    fn read_tags_rejects_bad_index() {
        let strings = vec!["k".to_string()];
        let bytes = [1, 0, 4];
        let mut reader = BitReader::new(&bytes);
        let err = read_tags(&mut reader, &strings, &CodecLimits::for_testing()).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRangeIndex { index: 4, .. }));
    }

    #[test]
    fn check_tags_counts_present_tags_only() {
        let limits = CodecLimits {
            max_tags_per_element: 1,
            ..CodecLimits::for_testing()
        };
        let one: Tags = [("name", "A")].into_iter().collect();
        let two: Tags = [("name", "A"), ("ref", "B")].into_iter().collect();
        assert!(check_tags(None, &limits).is_ok());
        assert!(check_tags(Some(&one), &limits).is_ok());
        assert_eq!(
            check_tags(Some(&two), &limits).unwrap_err(),
            CodecError::LimitsExceeded {
                kind: LimitKind::TagsPerElement,
                limit: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn read_count_enforces_limit() {
        let bytes = [40];
        let mut reader = BitReader::new(&bytes);
        let err = read_count(&mut reader, LimitKind::TagsPerElement, 32).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::TagsPerElement,
                limit: 32,
                actual: 40
            }
        ));
    }
}
