//! Limits for codec-level decoding.

/// Codec-specific limits enforced while encoding batches and decoding
/// untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum number of entries in a string table.
    pub max_strings: usize,
    /// Maximum length in bytes of one string table entry.
    pub max_string_len: usize,
    /// Maximum number of elements in one element section.
    pub max_elements: usize,
    /// Maximum number of tags on one element or minor.
    pub max_tags_per_element: usize,
    /// Maximum number of way nodes or relation members on one element or minor.
    pub max_members_per_element: usize,
    /// Maximum number of minor versions on one element.
    pub max_minors_per_element: usize,
    /// Maximum number of bytes in a section body or element fragment.
    pub max_section_bytes: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_strings: 1 << 20,
            max_string_len: 64 * 1024,
            max_elements: 1 << 20,
            max_tags_per_element: 4096,
            max_members_per_element: 1 << 16,
            max_minors_per_element: 4096,
            max_section_bytes: 64 * 1024 * 1024,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_strings: 1024,
            max_string_len: 256,
            max_elements: 256,
            max_tags_per_element: 32,
            max_members_per_element: 64,
            max_minors_per_element: 16,
            max_section_bytes: 64 * 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_strings: usize::MAX,
            max_string_len: usize::MAX,
            max_elements: usize::MAX,
            max_tags_per_element: usize::MAX,
            max_members_per_element: usize::MAX,
            max_minors_per_element: usize::MAX,
            max_section_bytes: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_reasonable() {
        let limits = CodecLimits::default();
        // OSM caps way length at 2000 nodes.
        assert!(limits.max_members_per_element >= 2000);
        assert!(limits.max_section_bytes >= 1024 * 1024);
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = CodecLimits::for_testing();
        let default_limits = CodecLimits::default();
        assert!(test_limits.max_elements < default_limits.max_elements);
        assert!(test_limits.max_strings < default_limits.max_strings);
        assert!(test_limits.max_section_bytes < default_limits.max_section_bytes);
    }

    #[test]
    fn unlimited_limits() {
        let limits = CodecLimits::unlimited();
        assert_eq!(limits.max_elements, usize::MAX);
        assert_eq!(limits.max_section_bytes, usize::MAX);
    }
}
