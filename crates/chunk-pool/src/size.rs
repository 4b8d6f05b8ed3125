// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Human-readable byte sizes for pool capacity and chunk size.

use crate::PoolError;
use std::fmt;

/// A non-zero byte count.
///
/// # Parsing
/// Case-insensitive, binary multiples:
/// - `"1000"` or `"1000B"` → 1000 bytes
/// - `"4K"` or `"4KB"` → 4 × 1024 bytes
/// - `"2M"` or `"2MB"` → 2 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
///
/// # Examples
/// ```
/// use chunk_pool::ByteSize;
///
/// assert_eq!(ByteSize::parse("4K").unwrap().as_bytes(), 4096);
/// assert_eq!(ByteSize::from_bytes(1000).to_string(), "1000 B");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ByteSize {
    bytes: usize,
}

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

impl ByteSize {
    /// Creates a size from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a size from kilobytes.
    pub fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KB }
    }

    /// Returns the size in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Parses a human-readable size string.
    pub fn parse(s: &str) -> Result<Self, PoolError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PoolError::Config("empty size string".into()));
        }

        let upper = s.to_ascii_uppercase();
        let (digits, multiplier) = [
            ("GB", GB),
            ("G", GB),
            ("MB", MB),
            ("M", MB),
            ("KB", KB),
            ("K", KB),
            ("B", 1),
        ]
        .iter()
        .find_map(|(suffix, mult)| {
            upper
                .strip_suffix(suffix)
                .map(|rest| (rest.trim(), *mult))
        })
        .unwrap_or((upper.as_str(), 1));

        let value: usize = digits.parse().map_err(|_| {
            PoolError::Config(format!(
                "invalid size '{s}': expected a number with an optional K, M or G suffix"
            ))
        })?;
        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| PoolError::Config(format!("size overflow: '{s}'")))?;
        if bytes == 0 {
            return Err(PoolError::Config(format!("size must be non-zero: '{s}'")));
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bytes;
        if b >= GB && b % GB == 0 {
            write!(f, "{} GB", b / GB)
        } else if b >= MB && b % MB == 0 {
            write!(f, "{} MB", b / MB)
        } else if b >= KB && b % KB == 0 {
            write!(f, "{} KB", b / KB)
        } else {
            write!(f, "{b} B")
        }
    }
}

impl std::str::FromStr for ByteSize {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(ByteSize::parse("1000").unwrap().as_bytes(), 1000);
        assert_eq!(ByteSize::parse("16b").unwrap().as_bytes(), 16);
        assert_eq!(ByteSize::parse("4K").unwrap().as_bytes(), 4096);
        assert_eq!(ByteSize::parse("4kb").unwrap().as_bytes(), 4096);
        assert_eq!(ByteSize::parse("2M").unwrap().as_bytes(), 2 * MB);
        assert_eq!(ByteSize::parse("1GB").unwrap().as_bytes(), GB);
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(ByteSize::parse("  64 K ").unwrap().as_bytes(), 64 * KB);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ByteSize::parse("").is_err());
        assert!(ByteSize::parse("abc").is_err());
        assert!(ByteSize::parse("0").is_err());
        assert!(ByteSize::parse("-4K").is_err());
        assert!(ByteSize::parse(&format!("{}G", usize::MAX)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteSize::from_bytes(100).to_string(), "100 B");
        assert_eq!(ByteSize::from_bytes(1000).to_string(), "1000 B");
        assert_eq!(ByteSize::from_kb(2).to_string(), "2 KB");
        assert_eq!(ByteSize::from_bytes(3 * MB).to_string(), "3 MB");
        assert_eq!(ByteSize::from_bytes(GB).to_string(), "1 GB");
    }

    #[test]
    fn test_from_str() {
        let s: ByteSize = "8K".parse().unwrap();
        assert_eq!(s, ByteSize::from_kb(8));
    }

    #[test]
    fn test_serde_is_plain_number() {
        let json = serde_json::to_string(&ByteSize::from_bytes(512)).unwrap();
        assert_eq!(json, "512");
        let back: ByteSize = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_bytes(), 512);
    }
}
