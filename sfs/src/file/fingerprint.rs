//! Content fingerprints.
//!
//! A fingerprint is the SHA-256 digest of a file's compiled contents,
//! rendered as lowercase hex. It is a change-detection and versioning token
//! and doubles as the hot-path cache key for the file.

use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters shown by [`Fingerprint::short`].
const SHORT_LEN: usize = 12;

/// Deterministic digest of some content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a single buffer.
    pub fn of(content: impl AsRef<[u8]>) -> Self {
        Self::of_parts([content])
    }

    /// Fingerprint a sequence of parts as if they were one buffer.
    ///
    /// Equal to [`Fingerprint::of`] applied to the concatenation of the parts.
    pub fn of_parts<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_ref());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated digest for log output.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Fingerprint::of("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(Fingerprint::of("hello world"), Fingerprint::of("hello world"));
        assert_eq!(Fingerprint::of(b"abc"), Fingerprint::of(vec![b'a', b'b', b'c']));
    }

    #[test]
    fn test_single_byte_difference_changes_digest() {
        assert_ne!(Fingerprint::of("hello world"), Fingerprint::of("hello worle"));
    }

    #[test]
    fn test_parts_match_concatenation() {
        let parts = ["body { ", "color: red", " }"];
        assert_eq!(
            Fingerprint::of_parts(parts),
            Fingerprint::of("body { color: red }")
        );
    }

    #[test]
    fn test_empty_parts_match_empty_content() {
        let parts: [&[u8]; 0] = [];
        assert_eq!(Fingerprint::of_parts(parts), Fingerprint::of(""));
    }

    #[test]
    fn test_display_and_short() {
        let fingerprint = Fingerprint::of("x");
        assert_eq!(fingerprint.to_string().len(), 64);
        assert_eq!(fingerprint.short().len(), 12);
        assert!(fingerprint.as_str().starts_with(fingerprint.short()));
    }
}
