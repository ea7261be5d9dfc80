//! Shared string table.

use std::collections::HashMap;

use bitstream::{BitReader, BitWriter};

use crate::error::{CodecError, CodecResult, IndexKind, LimitKind};
use crate::limits::CodecLimits;

/// Deduplicating string table built while encoding one payload.
///
/// Indices are assigned in order of first occurrence and never change.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `value`, appending it if it is new.
    // Tables are bounded by `CodecLimits::max_strings` far below `u32::MAX`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(&index) = self.index.get(value) {
            return index;
        }
        let index = self.strings.len() as u32;
        self.strings.push(value.to_owned());
        self.index.insert(value.to_owned(), index);
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// The strings in index order.
    #[must_use]
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Consumes the table, returning the strings in index order.
    #[must_use]
    pub fn finalize(self) -> Vec<String> {
        self.strings
    }
}

/// Looks up `index` in a decoded table.
pub fn resolve(index: u32, strings: &[String]) -> CodecResult<&str> {
    strings
        .get(index as usize)
        .map(String::as_str)
        .ok_or(CodecError::OutOfRangeIndex {
            kind: IndexKind::String,
            index: u64::from(index),
            len: strings.len(),
        })
}

/// Encodes a table as a section body: count, then length-prefixed UTF-8.
pub fn encode_string_table(strings: &[String]) -> CodecResult<Vec<u8>> {
    let total: usize = strings.iter().map(String::len).sum();
    let mut writer = BitWriter::with_capacity(total + strings.len() + 4);
    writer.write_varu32(count_u32(strings.len(), LimitKind::Strings)?)?;
    for value in strings {
        writer.write_varu32(count_u32(value.len(), LimitKind::StringBytes)?)?;
        writer.write_bytes_aligned(value.as_bytes())?;
    }
    Ok(writer.finish())
}

/// Decodes a table section body.
pub fn decode_string_table(body: &[u8], limits: &CodecLimits) -> CodecResult<Vec<String>> {
    if body.len() > limits.max_section_bytes {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::SectionBytes,
            limit: limits.max_section_bytes,
            actual: body.len(),
        });
    }

    let mut reader = BitReader::new(body);
    let count = reader.read_varu32()? as usize;
    if count > limits.max_strings {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::Strings,
            limit: limits.max_strings,
            actual: count,
        });
    }

    let mut strings = Vec::with_capacity(count.min(body.len()));
    for index in 0..count {
        let len = reader.read_varu32()? as usize;
        if len > limits.max_string_len {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::StringBytes,
                limit: limits.max_string_len,
                actual: len,
            });
        }
        let bytes = reader.read_bytes_aligned(len)?;
        let value = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { index })?;
        strings.push(value.to_owned());
    }

    ensure_consumed(&reader)?;
    Ok(strings)
}

pub(crate) fn count_u32(count: usize, kind: LimitKind) -> CodecResult<u32> {
    u32::try_from(count).map_err(|_| CodecError::LimitsExceeded {
        kind,
        limit: u32::MAX as usize,
        actual: count,
    })
}

pub(crate) fn ensure_consumed(reader: &BitReader<'_>) -> CodecResult<()> {
    let remaining_bits = reader.bits_remaining();
    if remaining_bits != 0 {
        return Err(CodecError::TrailingData { remaining_bits });
    }
    Ok(())
}
