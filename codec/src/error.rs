//! Error types for codec operations.

use std::fmt;

use model::ElementKind;
use wire::{PayloadKind, SectionTag};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding map elements.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// Wire framing error.
    Wire(wire::DecodeError),

    /// Payload could not be framed.
    Encode(wire::EncodeError),

    /// Bitstream error other than running out of input.
    Bitstream(bitstream::BitError),

    /// A field declared more data than the input holds.
    Truncated { requested: usize, available: usize },

    /// An index points past the end of its table or enumeration.
    OutOfRangeIndex {
        kind: IndexKind,
        index: u64,
        len: usize,
    },

    /// A minor-version delta cannot be applied.
    MalformedDelta {
        kind: ElementKind,
        id: i64,
        minor: usize,
        reason: DeltaReason,
    },

    /// An element is missing data its role requires.
    SchemaMismatch {
        kind: ElementKind,
        id: i64,
        reason: SchemaReason,
    },

    /// A string table entry is not valid UTF-8.
    InvalidUtf8 { index: usize },

    /// The same tag key appears twice on one element.
    DuplicateTagKey { key: String },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Bits left over after a fragment or section was fully parsed.
    TrailingData { remaining_bits: usize },

    /// Section not allowed in this payload.
    UnexpectedSection { section: SectionTag },

    /// Duplicate section encountered.
    DuplicateSection { section: SectionTag },

    /// A required section is missing.
    MissingSection { section: SectionTag },

    /// The payload holds a different kind of data than requested.
    UnexpectedPayloadKind {
        expected: PayloadKind,
        found: PayloadKind,
    },
}

/// What an out-of-range index was indexing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    String,
    MemberType,
}

/// Why a minor-version delta was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaReason {
    /// The first minor claims to repeat a predecessor.
    NoPredecessor,
    /// The predecessor recorded no member list to repeat.
    PredecessorWithoutMembers,
    /// A repeat marker without the member-presence flag.
    RepeatWithoutMembers,
}

/// Why an element does not fit its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaReason {
    /// A visible node has no coordinates.
    MissingCoordinates,
    /// A coordinate is not finite or lies outside its valid range.
    CoordinateOutOfRange,
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Strings,
    StringBytes,
    Elements,
    TagsPerElement,
    MembersPerElement,
    MinorsPerElement,
    SectionBytes,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::Encode(e) => write!(f, "framing error: {e}"),
            Self::Bitstream(e) => write!(f, "bitstream error: {e}"),
            Self::Truncated {
                requested,
                available,
            } => {
                write!(
                    f,
                    "truncated input: need {requested} bits, have {available}"
                )
            }
            Self::OutOfRangeIndex { kind, index, len } => {
                write!(f, "{kind} index {index} out of range (len {len})")
            }
            Self::MalformedDelta {
                kind,
                id,
                minor,
                reason,
            } => {
                write!(f, "malformed delta in {kind} {id} minor {minor}: {reason}")
            }
            Self::SchemaMismatch { kind, id, reason } => {
                write!(f, "{kind} {id} does not match its schema: {reason}")
            }
            Self::InvalidUtf8 { index } => {
                write!(f, "string table entry {index} is not valid utf-8")
            }
            Self::DuplicateTagKey { key } => {
                write!(f, "duplicate tag key '{key}'")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::TrailingData { remaining_bits } => {
                write!(f, "trailing data: {remaining_bits} bits")
            }
            Self::UnexpectedSection { section } => {
                write!(f, "unexpected section {section:?} in payload")
            }
            Self::DuplicateSection { section } => {
                write!(f, "duplicate section {section:?} in payload")
            }
            Self::MissingSection { section } => {
                write!(f, "missing section {section:?} in payload")
            }
            Self::UnexpectedPayloadKind { expected, found } => {
                write!(f, "expected {expected:?} payload, found {found:?}")
            }
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::MemberType => "member type",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for DeltaReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoPredecessor => "repeat marker with no previous minor",
            Self::PredecessorWithoutMembers => "previous minor has no member list",
            Self::RepeatWithoutMembers => "repeat marker without member flag",
        };
        write!(f, "{reason}")
    }
}

impl fmt::Display for SchemaReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::MissingCoordinates => "visible node without coordinates",
            Self::CoordinateOutOfRange => "coordinate out of range",
        };
        write!(f, "{reason}")
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Strings => "strings",
            Self::StringBytes => "string bytes",
            Self::Elements => "elements",
            Self::TagsPerElement => "tags per element",
            Self::MembersPerElement => "members per element",
            Self::MinorsPerElement => "minors per element",
            Self::SectionBytes => "section bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::Encode(e) => Some(e),
            Self::Bitstream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wire::DecodeError> for CodecError {
    fn from(err: wire::DecodeError) -> Self {
        Self::Wire(err)
    }
}

impl From<wire::EncodeError> for CodecError {
    fn from(err: wire::EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<bitstream::BitError> for CodecError {
    fn from(err: bitstream::BitError) -> Self {
        match err {
            bitstream::BitError::UnexpectedEof {
                requested,
                available,
            } => Self::Truncated {
                requested,
                available,
            },
            other => Self::Bitstream(other),
        }
    }
}
