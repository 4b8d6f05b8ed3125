// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pool configuration loaded from TOML files or constructed programmatically.
//!
//! Geometry is fixed once a pool is built; there is no way to apply a new
//! configuration to an existing [`ChunkPool`](crate::ChunkPool).
//!
//! # TOML Format
//! ```toml
//! capacity = "1K"
//! chunk_size = "16"
//! base_alignment = 16
//! exhaustion = "recoverable"
//! ```

use crate::{ByteSize, ExhaustionPolicy, PoolError};
use std::path::Path;

/// Construction-time parameters for a [`ChunkPool`](crate::ChunkPool).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PoolConfig {
    /// Total arena capacity (human-readable, e.g. `"64K"`).
    pub capacity: String,
    /// Chunk granularity (human-readable, e.g. `"16"`).
    pub chunk_size: String,
    /// Alignment of the arena base address.
    #[serde(default = "default_base_alignment")]
    pub base_alignment: usize,
    /// What adapters built from this config do when the pool is exhausted.
    #[serde(default)]
    pub exhaustion: ExhaustionPolicy,
}

fn default_base_alignment() -> usize {
    crate::pool::DEFAULT_BASE_ALIGNMENT
}

impl PoolConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PoolError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PoolError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PoolError> {
        toml::from_str(toml_str).map_err(|e| PoolError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, PoolError> {
        toml::to_string_pretty(self)
            .map_err(|e| PoolError::Config(format!("TOML serialise error: {e}")))
    }

    /// Parses the capacity string.
    pub fn parse_capacity(&self) -> Result<ByteSize, PoolError> {
        ByteSize::parse(&self.capacity).map_err(|e| with_field("capacity", e))
    }

    /// Parses the chunk size string.
    pub fn parse_chunk_size(&self) -> Result<ByteSize, PoolError> {
        ByteSize::parse(&self.chunk_size).map_err(|e| with_field("chunk size", e))
    }
}

fn with_field(field: &str, err: PoolError) -> PoolError {
    match err {
        PoolError::Config(msg) => PoolError::Config(format!("{field}: {msg}")),
        other => other,
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: "1K".to_string(),
            chunk_size: "16".to_string(),
            base_alignment: default_base_alignment(),
            exhaustion: ExhaustionPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = PoolConfig::default();
        assert_eq!(c.parse_capacity().unwrap().as_bytes(), 1024);
        assert_eq!(c.parse_chunk_size().unwrap().as_bytes(), 16);
        assert_eq!(c.base_alignment, 16);
        assert_eq!(c.exhaustion, ExhaustionPolicy::Recoverable);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
capacity = "1000"
chunk_size = "100"
base_alignment = 64
exhaustion = "abort"
"#;
        let c = PoolConfig::from_toml(toml).unwrap();
        assert_eq!(c.parse_capacity().unwrap().as_bytes(), 1000);
        assert_eq!(c.parse_chunk_size().unwrap().as_bytes(), 100);
        assert_eq!(c.base_alignment, 64);
        assert_eq!(c.exhaustion, ExhaustionPolicy::Abort);
    }

    #[test]
    fn test_from_toml_defaults_optional_fields() {
        let c = PoolConfig::from_toml("capacity = \"4K\"\nchunk_size = \"32\"\n").unwrap();
        assert_eq!(c.base_alignment, 16);
        assert_eq!(c.exhaustion, ExhaustionPolicy::Recoverable);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = PoolConfig {
            capacity: "64K".into(),
            exhaustion: ExhaustionPolicy::Abort,
            ..Default::default()
        };
        let back = PoolConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_invalid_sizes() {
        let c = PoolConfig {
            capacity: "lots".into(),
            chunk_size: "0".into(),
            ..Default::default()
        };
        assert!(matches!(c.parse_capacity(), Err(PoolError::Config(_))));
        assert!(matches!(c.parse_chunk_size(), Err(PoolError::Config(_))));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            PoolConfig::from_toml("capacity = "),
            Err(PoolError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = PoolConfig::from_file(Path::new("/nonexistent/chunk-pool.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }
}
