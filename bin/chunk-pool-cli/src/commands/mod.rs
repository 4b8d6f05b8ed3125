// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod demo;
pub mod map;
pub mod stress;

use chunk_pool::PoolConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber. `RUST_LOG` wins over `-v` flags.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// A config file, when given, replaces the size arguments entirely.
pub fn resolve_config(
    path: Option<&Path>,
    capacity: String,
    chunk_size: String,
) -> anyhow::Result<PoolConfig> {
    let config = match path {
        Some(path) => PoolConfig::from_file(path)?,
        None => PoolConfig {
            capacity,
            chunk_size,
            ..Default::default()
        },
    };
    tracing::info!(
        "pool config: capacity {}, chunk size {}, base alignment {}",
        config.capacity,
        config.chunk_size,
        config.base_alignment
    );
    Ok(config)
}

/// Renders the reservation map: `#` reserved, `.` free, 64 chunks per row.
pub fn render_map(map: &[bool]) -> String {
    map.chunks(64)
        .map(|row| {
            row.iter()
                .map(|&reserved| if reserved { '#' } else { '.' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
