//! Reading and writing the OSM XML interchange format.
//!
//! Minor versions of ways and relations appear as `<minor>` children carrying
//! `version`, `changeset`, `timestamp`, `uid` and `user` attributes plus their
//! own `<nd>`/`<member>`/`<tag>` children. XML cannot tell an empty tag list
//! apart from a missing one, so elements without `<tag>` children read back
//! with absent tags.

mod reader;
mod writer;

pub use reader::{parse_change, parse_osm};
pub use writer::{write_change, write_osm};

use crate::error::{XmlError, XmlResult};
use crate::ids::Timestamp;

fn parse_timestamp(element: &'static str, value: &str) -> XmlResult<Timestamp> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|time| Timestamp::new(time.timestamp()))
        .map_err(|_| XmlError::InvalidAttribute {
            element,
            attribute: "timestamp",
            value: value.to_string(),
        })
}

fn format_timestamp(timestamp: Timestamp) -> XmlResult<String> {
    chrono::DateTime::from_timestamp(timestamp.raw(), 0)
        .map(|time| time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .ok_or(XmlError::TimestampOutOfRange {
            seconds: timestamp.raw(),
        })
}
