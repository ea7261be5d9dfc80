//! Configurable limits for bounded decoding.

/// Wire-level limits for payload decoding.
///
/// These limits are enforced during decoding to prevent resource exhaustion
/// and ensure bounded memory usage. Section body parsing limits belong to the
/// codec layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum payload size in bytes, header included.
    pub max_payload_bytes: usize,

    /// Maximum number of sections in one section sequence.
    pub max_sections: usize,

    /// Maximum length of a single section body in bytes.
    pub max_section_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Large changesets run to tens of megabytes as XML; binary is smaller.
            max_payload_bytes: 64 * 1024 * 1024,

            // A changeset uses at most info, strings and three groups.
            max_sections: 16,
            max_section_len: 64 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_payload_bytes: 64 * 1024,
            max_sections: 8,
            max_section_len: 32 * 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_payload_bytes: usize::MAX,
            max_sections: usize::MAX,
            max_section_len: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_payload_bytes() {
        let limits = Limits::default();
        assert_eq!(limits.max_payload_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();

        assert!(test_limits.max_payload_bytes < default_limits.max_payload_bytes);
        assert!(test_limits.max_sections < default_limits.max_sections);
        assert!(test_limits.max_section_len < default_limits.max_section_len);
    }

    #[test]
    fn unlimited_limits() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_payload_bytes, usize::MAX);
        assert_eq!(limits.max_sections, usize::MAX);
        assert_eq!(limits.max_section_len, usize::MAX);
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_sections, 8);
    }
}
