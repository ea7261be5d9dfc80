//! XML conversion errors.

use std::fmt;

use quick_xml::events::attributes::AttrError;

/// Result type for XML conversion.
pub type XmlResult<T> = Result<T, XmlError>;

/// Errors that can occur when reading or writing map XML.
#[derive(Debug)]
#[non_exhaustive]
pub enum XmlError {
    /// The underlying XML is malformed.
    Xml(quick_xml::Error),

    /// A required attribute is missing.
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// An attribute value could not be parsed.
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    /// The document ended inside an element.
    UnexpectedEof { element: &'static str },

    /// A timestamp cannot be represented as RFC 3339.
    TimestampOutOfRange { seconds: i64 },

    /// Written output was not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(err) => write!(f, "xml error: {err}"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "<{element}> is missing required attribute '{attribute}'")
            }
            Self::InvalidAttribute {
                element,
                attribute,
                value,
            } => {
                write!(f, "<{element}> has invalid {attribute}=\"{value}\"")
            }
            Self::UnexpectedEof { element } => {
                write!(f, "document ended inside <{element}>")
            }
            Self::TimestampOutOfRange { seconds } => {
                write!(f, "timestamp {seconds} is out of range")
            }
            Self::InvalidUtf8 => write!(f, "output is not valid utf-8"),
        }
    }
}

impl std::error::Error for XmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err)
    }
}

impl From<AttrError> for XmlError {
    fn from(err: AttrError) -> Self {
        Self::Xml(quick_xml::Error::from(err))
    }
}
