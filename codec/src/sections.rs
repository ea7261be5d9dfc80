//! Section lookup and payload assembly shared by the batch and changeset
//! codecs.

use wire::{PayloadHeader, PayloadKind, SectionTag, WireSection};

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::CodecLimits;
use crate::strings::{encode_string_table, StringTable};

/// Section bodies of one sequence, keyed by tag.
#[derive(Debug, Default)]
pub(crate) struct SectionSet<'a> {
    bodies: Vec<(SectionTag, &'a [u8])>,
}

impl<'a> SectionSet<'a> {
    /// Collects `sections`, rejecting tags outside `allowed` and repeats.
    pub fn collect(sections: &[WireSection<'a>], allowed: &[SectionTag]) -> CodecResult<Self> {
        let mut set = Self::default();
        for section in sections {
            if !allowed.contains(&section.tag) {
                return Err(CodecError::UnexpectedSection {
                    section: section.tag,
                });
            }
            if set.get(section.tag).is_some() {
                return Err(CodecError::DuplicateSection {
                    section: section.tag,
                });
            }
            set.bodies.push((section.tag, section.body));
        }
        Ok(set)
    }

    pub fn get(&self, tag: SectionTag) -> Option<&'a [u8]> {
        self.bodies
            .iter()
            .find(|(found, _)| *found == tag)
            .map(|(_, body)| *body)
    }

    pub fn require(&self, tag: SectionTag) -> CodecResult<&'a [u8]> {
        self.get(tag)
            .ok_or(CodecError::MissingSection { section: tag })
    }
}

pub(crate) fn expect_kind(header: &PayloadHeader, expected: PayloadKind) -> CodecResult<()> {
    if header.kind != expected {
        return Err(CodecError::UnexpectedPayloadKind {
            expected,
            found: header.kind,
        });
    }
    Ok(())
}

pub(crate) fn check_section_len(len: usize, limits: &CodecLimits) -> CodecResult<()> {
    if len > limits.max_section_bytes {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::SectionBytes,
            limit: limits.max_section_bytes,
            actual: len,
        });
    }
    Ok(())
}

/// Appends each `(tag, body)` as a framed section.
pub(crate) fn write_sections(sections: &[(SectionTag, Vec<u8>)], out: &mut Vec<u8>) -> CodecResult<()> {
    for (tag, body) in sections {
        wire::encode_section(*tag, body, out)?;
    }
    Ok(())
}

/// Frames the string table followed by `sections` into a complete payload.
pub(crate) fn finish_payload(
    kind: PayloadKind,
    table: StringTable,
    sections: &[(SectionTag, Vec<u8>)],
    limits: &CodecLimits,
) -> CodecResult<Vec<u8>> {
    if table.len() > limits.max_strings {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::Strings,
            limit: limits.max_strings,
            actual: table.len(),
        });
    }
    if let Some(longest) = table.strings().iter().map(String::len).max() {
        if longest > limits.max_string_len {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::StringBytes,
                limit: limits.max_string_len,
                actual: longest,
            });
        }
    }
    let strings = table.finalize();
    let table_body = encode_string_table(&strings)?;
    check_section_len(table_body.len(), limits)?;

    let mut payload = Vec::with_capacity(
        table_body.len() + sections.iter().map(|(_, body)| body.len() + 6).sum::<usize>() + 6,
    );
    wire::encode_section(SectionTag::StringTable, &table_body, &mut payload)?;
    write_sections(sections, &mut payload)?;
    Ok(wire::encode_payload(kind, &payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(tag: SectionTag, body: &[u8]) -> WireSection<'_> {
        WireSection { tag, body }
    }

    #[test]
    fn collect_and_lookup() {
        let sections = [
            section(SectionTag::StringTable, &[0]),
            section(SectionTag::Nodes, &[1, 2]),
        ];
        let set = SectionSet::collect(&sections, &[SectionTag::StringTable, SectionTag::Nodes])
            .unwrap();
        assert_eq!(set.get(SectionTag::Nodes), Some(&[1u8, 2][..]));
        assert_eq!(
            set.require(SectionTag::Ways).unwrap_err(),
            CodecError::MissingSection {
                section: SectionTag::Ways
            }
        );
    }

    #[test]
    fn collect_rejects_unexpected_and_duplicate() {
        let sections = [section(SectionTag::Ways, &[])];
        let err = SectionSet::collect(&sections, &[SectionTag::Nodes]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedSection {
                section: SectionTag::Ways
            }
        );

        let sections = [section(SectionTag::Nodes, &[]), section(SectionTag::Nodes, &[])];
        let err = SectionSet::collect(&sections, &[SectionTag::Nodes]).unwrap_err();
        assert_eq!(
            err,
            CodecError::DuplicateSection {
                section: SectionTag::Nodes
            }
        );
    }

    #[test]
    fn finish_payload_enforces_string_limit() {
        let mut table = StringTable::new();
        table.intern("a");
        table.intern("b");
        let limits = CodecLimits {
            max_strings: 1,
            ..CodecLimits::for_testing()
        };
        let err = finish_payload(PayloadKind::Nodes, table, &[], &limits).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::Strings,
                ..
            }
        ));
    }

    #[test]
    fn finish_payload_enforces_string_length() {
        let mut table = StringTable::new();
        table.intern("short");
        table.intern(&"x".repeat(257));
        let err = finish_payload(PayloadKind::Nodes, table, &[], &CodecLimits::for_testing())
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::LimitsExceeded {
                kind: LimitKind::StringBytes,
                limit: 256,
                actual: 257
            }
        );
    }

    #[test]
    fn expect_kind_mismatch() {
        let header = PayloadHeader::for_payload(PayloadKind::Ways, &[]).unwrap();
        assert!(expect_kind(&header, PayloadKind::Ways).is_ok());
        assert_eq!(
            expect_kind(&header, PayloadKind::Nodes).unwrap_err(),
            CodecError::UnexpectedPayloadKind {
                expected: PayloadKind::Nodes,
                found: PayloadKind::Ways
            }
        );
    }
}
