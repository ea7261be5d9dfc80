//! Payload decoding and section framing.

use bitstream::{varu64_len, BitError, BitReader, BitResult, BitWriter};

use crate::error::{DecodeError, EncodeError, LimitKind, SectionFramingError, WireResult};
use crate::hash::payload_hash;
use crate::header::{PayloadHeader, PayloadKind, HEADER_SIZE, MAGIC, VERSION};
use crate::limits::Limits;

/// Section tags for version 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum SectionTag {
    StringTable = 1,
    Nodes = 2,
    Ways = 3,
    Relations = 4,
    ChangesetInfo = 5,
    Create = 6,
    Modify = 7,
    Delete = 8,
}

impl SectionTag {
    /// Parses a section tag from a raw byte.
    pub const fn parse(tag: u8) -> Result<Self, DecodeError> {
        match tag {
            1 => Ok(Self::StringTable),
            2 => Ok(Self::Nodes),
            3 => Ok(Self::Ways),
            4 => Ok(Self::Relations),
            5 => Ok(Self::ChangesetInfo),
            6 => Ok(Self::Create),
            7 => Ok(Self::Modify),
            8 => Ok(Self::Delete),
            _ => Err(DecodeError::UnknownSectionTag { tag }),
        }
    }

    /// Returns true for tags whose body is itself a section sequence.
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Create | Self::Modify | Self::Delete)
    }
}

/// A section within a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireSection<'a> {
    pub tag: SectionTag,
    pub body: &'a [u8],
}

/// A decoded payload: header plus top-level section slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePayload<'a> {
    pub header: PayloadHeader,
    pub sections: Vec<WireSection<'a>>,
}

/// Decodes a framed payload into header + section slices.
///
/// The payload hash is verified before any section is parsed.
pub fn decode_payload<'a>(buf: &'a [u8], limits: &Limits) -> WireResult<WirePayload<'a>> {
    let header = decode_header(buf, limits)?;
    let payload = &buf[HEADER_SIZE..];

    let computed = payload_hash(payload);
    if computed != header.payload_hash {
        return Err(DecodeError::PayloadHashMismatch {
            expected: header.payload_hash,
            found: computed,
        });
    }

    let sections = decode_sections(payload, limits)?;
    Ok(WirePayload { header, sections })
}

/// Decodes and validates the fixed header at the front of `buf`.
pub fn decode_header(buf: &[u8], limits: &Limits) -> WireResult<PayloadHeader> {
    if buf.len() < HEADER_SIZE {
        return Err(DecodeError::PayloadTooSmall {
            actual: buf.len(),
            required: HEADER_SIZE,
        });
    }
    if buf.len() > limits.max_payload_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::PayloadBytes,
            limit: limits.max_payload_bytes,
            actual: buf.len(),
        });
    }

    let magic = u32::from_le_bytes(fixed_bytes(buf, 0));
    if magic != MAGIC {
        return Err(DecodeError::InvalidMagic { found: magic });
    }

    let version = buf[4];
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }

    let kind = PayloadKind::parse(buf[5])?;
    let payload_hash = u64::from_le_bytes(fixed_bytes(buf, 6));
    let payload_len = u32::from_le_bytes(fixed_bytes(buf, 14));

    let actual_payload_len = buf.len() - HEADER_SIZE;
    if payload_len as usize != actual_payload_len {
        return Err(DecodeError::PayloadLengthMismatch {
            header_len: payload_len,
            actual_len: actual_payload_len,
        });
    }

    Ok(PayloadHeader {
        version,
        kind,
        payload_hash,
        payload_len,
    })
}

/// Decodes sections from a payload buffer (no header).
///
/// Group section bodies are returned as-is; callers decode them with
/// another call to this function.
pub fn decode_sections<'a>(payload: &'a [u8], limits: &Limits) -> WireResult<Vec<WireSection<'a>>> {
    let mut offset = 0usize;
    let mut sections = Vec::new();

    while offset < payload.len() {
        if sections.len() >= limits.max_sections {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::SectionCount,
                limit: limits.max_sections,
                actual: sections.len() + 1,
            });
        }

        let tag = SectionTag::parse(payload[offset])?;
        offset += 1;

        let (len, consumed) = read_section_len(&payload[offset..])?;
        offset += consumed;

        if len > limits.max_section_len {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::SectionLength,
                limit: limits.max_section_len,
                actual: len,
            });
        }
        let end = offset.checked_add(len).unwrap_or(usize::MAX);
        if end > payload.len() {
            return Err(DecodeError::SectionFraming(
                SectionFramingError::Truncated {
                    needed: end,
                    available: payload.len(),
                },
            ));
        }

        sections.push(WireSection {
            tag,
            body: &payload[offset..end],
        });
        offset = end;
    }

    Ok(sections)
}

/// Encodes a header into the provided output buffer.
pub fn encode_header(header: &PayloadHeader, out: &mut [u8]) -> Result<usize, EncodeError> {
    if out.len() < HEADER_SIZE {
        return Err(EncodeError::BufferTooSmall {
            needed: HEADER_SIZE,
            available: out.len(),
        });
    }

    out[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    out[4] = header.version;
    out[5] = header.kind.raw();
    out[6..14].copy_from_slice(&header.payload_hash.to_le_bytes());
    out[14..18].copy_from_slice(&header.payload_len.to_le_bytes());

    Ok(HEADER_SIZE)
}

/// Appends a single framed section to `out`, returning the bytes written.
pub fn encode_section(tag: SectionTag, body: &[u8], out: &mut Vec<u8>) -> Result<usize, EncodeError> {
    let len_u32 = u32::try_from(body.len())
        .map_err(|_| EncodeError::LengthOverflow { length: body.len() })?;

    let mut writer = BitWriter::with_capacity(1 + varu64_len(u64::from(len_u32)) + body.len());
    write_framed(&mut writer, tag, len_u32, body)
        .map_err(|_| EncodeError::LengthOverflow { length: body.len() })?;

    let start = out.len();
    writer.finish_into(out);
    Ok(out.len() - start)
}

/// Prefixes `payload` with a header for `kind`, producing a complete buffer.
pub fn encode_payload(kind: PayloadKind, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let header = PayloadHeader::for_payload(kind, payload)?;
    let mut buf = vec![0u8; HEADER_SIZE + payload.len()];
    encode_header(&header, &mut buf)?;
    buf[HEADER_SIZE..].copy_from_slice(payload);
    Ok(buf)
}

// A fresh writer is always byte-aligned, so this cannot fail in practice.
fn write_framed(writer: &mut BitWriter, tag: SectionTag, len: u32, body: &[u8]) -> BitResult<()> {
    writer.write_u8_aligned(tag as u8)?;
    writer.write_varu32(len)?;
    writer.write_bytes_aligned(body)
}

fn read_section_len(buf: &[u8]) -> WireResult<(usize, usize)> {
    let mut reader = BitReader::new(buf);
    let len = reader.read_varu32().map_err(|err| match err {
        BitError::UnexpectedEof { .. } => {
            DecodeError::SectionFraming(SectionFramingError::Truncated {
                needed: buf.len() + 1,
                available: buf.len(),
            })
        }
        _ => DecodeError::SectionFraming(SectionFramingError::InvalidVarint),
    })?;
    let consumed = reader.bit_position() / 8;
    let len = usize::try_from(len)
        .map_err(|_| DecodeError::SectionFraming(SectionFramingError::InvalidVarint))?;
    Ok((len, consumed))
}

fn fixed_bytes<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&buf[offset..offset + N]);
    bytes
}
