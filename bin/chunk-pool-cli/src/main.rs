// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # chunk-pool
//!
//! Command-line front end for the chunk-pool allocator.
//!
//! ## Usage
//! ```bash
//! # Put a Vec and a string on a pool and print what happened
//! chunk-pool demo --capacity 1K --chunk-size 16
//!
//! # Hammer one pool from several threads
//! chunk-pool stress --threads 8 --iterations 10000 --max-bytes 256
//!
//! # Show the fragmentation scenario as a chunk map
//! chunk-pool map
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chunk-pool",
    about = "Fixed-capacity chunk pool allocator demos",
    version,
    author
)]
struct Cli {
    /// Path to a TOML pool configuration (overrides size arguments).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run host containers on a pool-backed allocator.
    Demo {
        /// Pool capacity (e.g., "1000", "4K").
        #[arg(long, default_value = "1K")]
        capacity: String,

        /// Chunk size (e.g., "16", "100").
        #[arg(long, default_value = "16")]
        chunk_size: String,
    },

    /// Allocate and free random sizes from many threads at once.
    Stress {
        /// Pool capacity.
        #[arg(long, default_value = "64K")]
        capacity: String,

        /// Chunk size.
        #[arg(long, default_value = "16")]
        chunk_size: String,

        /// Number of worker threads.
        #[arg(short, long, default_value_t = 8)]
        threads: usize,

        /// Operations per thread.
        #[arg(short, long, default_value_t = 10_000)]
        iterations: usize,

        /// Largest single request in bytes.
        #[arg(long, default_value_t = 256)]
        max_bytes: usize,

        /// Print final statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Reproduce a fragmented pool and print its reservation map.
    Map {
        /// Pool capacity.
        #[arg(long, default_value = "1000")]
        capacity: String,

        /// Chunk size.
        #[arg(long, default_value = "100")]
        chunk_size: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Demo {
            capacity,
            chunk_size,
        } => {
            let config = commands::resolve_config(cli.config.as_deref(), capacity, chunk_size)?;
            commands::demo::execute(&config)
        }
        Commands::Stress {
            capacity,
            chunk_size,
            threads,
            iterations,
            max_bytes,
            json,
        } => {
            let config = commands::resolve_config(cli.config.as_deref(), capacity, chunk_size)?;
            commands::stress::execute(&config, threads, iterations, max_bytes, json)
        }
        Commands::Map {
            capacity,
            chunk_size,
        } => {
            let config = commands::resolve_config(cli.config.as_deref(), capacity, chunk_size)?;
            commands::map::execute(&config)
        }
    }
}
