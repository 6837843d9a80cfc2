//! Human-readable byte sizes ("512MB", "2GB").

use std::fmt;
use thiserror::Error;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Recognised suffixes, longest first so "GB" wins over "B".
const SUFFIXES: [(&str, usize); 7] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
    ("B", 1),
];

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '2GB', '500MB', '1024KB' or a byte count")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a size string into bytes.
///
/// Accepts a bare byte count or a number followed by a binary `K`/`M`/`G`
/// suffix (optionally with a trailing `B`). Case and surrounding whitespace
/// are ignored.
///
/// # Examples
///
/// ```
/// use sfs::config::parse_size;
///
/// assert_eq!(parse_size("1700000000").unwrap(), 1_700_000_000);
/// assert_eq!(parse_size("1KB").unwrap(), 1024);
/// assert_eq!(parse_size("512 mb").unwrap(), 512 * 1024 * 1024);
/// assert!(parse_size("lots").is_err());
/// ```
pub fn parse_size(s: &str) -> Result<usize, SizeParseError> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (number, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, multiplier)| {
            upper
                .strip_suffix(suffix)
                .map(|rest| (rest.trim_end(), *multiplier))
        })
        .unwrap_or((upper.as_str(), 1));

    if number.is_empty() {
        return Err(SizeParseError::new(trimmed));
    }

    number
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| SizeParseError::new(trimmed))
}

/// Format a byte count using the largest suffix that divides it exactly.
///
/// # Examples
///
/// ```
/// use sfs::config::format_size;
///
/// assert_eq!(format_size(512 * 1024 * 1024), "512MB");
/// assert_eq!(format_size(1_700_000_000), "1700000000");
/// ```
pub fn format_size(bytes: usize) -> String {
    [("GB", GB), ("MB", MB), ("KB", KB)]
        .iter()
        .find(|(_, unit)| bytes >= *unit && bytes % unit == 0)
        .map(|(suffix, unit)| format!("{}{}", bytes / unit, suffix))
        .unwrap_or_else(|| bytes.to_string())
}

/// A byte count that parses from and displays as a human-readable size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Size(pub usize);

impl Size {
    pub fn bytes(self) -> usize {
        self.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_size(self.0))
    }
}

impl std::str::FromStr for Size {
    type Err = SizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_size(s).map(Size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_bytes() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("100").unwrap(), 100);
        assert_eq!(parse_size("  42  ").unwrap(), 42);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(parse_size("2K").unwrap(), 2 * KB);
        assert_eq!(parse_size("2kb").unwrap(), 2 * KB);
        assert_eq!(parse_size("3M").unwrap(), 3 * MB);
        assert_eq!(parse_size("3 MB").unwrap(), 3 * MB);
        assert_eq!(parse_size("1g").unwrap(), GB);
        assert_eq!(parse_size("10B").unwrap(), 10);
    }

    #[test]
    fn test_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("MB").is_err());
        assert!(parse_size("-5MB").is_err());
        assert!(parse_size("1.5GB").is_err());
        assert!(parse_size("12XB").is_err());
    }

    #[test]
    fn test_overflow_is_rejected() {
        let too_big = format!("{}GB", usize::MAX);
        assert!(parse_size(&too_big).is_err());
    }

    #[test]
    fn test_error_message_contains_input() {
        let err = parse_size("plenty").unwrap_err();
        assert!(err.to_string().contains("'plenty'"));
    }

    #[test]
    fn test_format() {
        assert_eq!(format_size(0), "0");
        assert_eq!(format_size(1000), "1000");
        assert_eq!(format_size(KB), "1KB");
        assert_eq!(format_size(1536 * KB), "1536KB");
        assert_eq!(format_size(2 * GB), "2GB");
    }

    #[test]
    fn test_size_display_and_parse() {
        let size: Size = "64MB".parse().unwrap();
        assert_eq!(size.bytes(), 64 * MB);
        assert_eq!(size.to_string(), "64MB");
    }
}
