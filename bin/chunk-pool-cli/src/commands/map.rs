// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `chunk-pool map`: fragment a pool and show why a request fails.
//!
//! Fills the pool one chunk at a time, frees every other chunk, then asks
//! for three chunks' worth of bytes. Half the pool is free but no three
//! free chunks are adjacent, so the request fails.

use chunk_pool::{ChunkPool, PoolConfig};

pub fn execute(config: &PoolConfig) -> anyhow::Result<()> {
    let pool = ChunkPool::from_config(config)?;
    let chunk = pool.chunk_size();

    let mut ptrs = Vec::with_capacity(pool.chunk_count());
    while let Ok(p) = pool.allocate(chunk, 1) {
        ptrs.push(p);
    }
    for p in ptrs.iter().skip(1).step_by(2) {
        // SAFETY: each pointer came from `allocate(chunk, 1)` above and is
        // freed once.
        unsafe { pool.deallocate(p.as_ptr(), chunk, 1) };
    }

    println!("Reservation map (# reserved, . free):");
    println!("{}", super::render_map(&pool.reservation_map()));
    println!();
    println!(
        "  Free:          {} bytes in {} chunks",
        pool.free_bytes(),
        pool.free_chunks()
    );
    println!("  Largest run:   {} chunks", pool.largest_free_run());
    println!("  Fragmentation: {:.0}%", pool.fragmentation() * 100.0);

    let request = 3 * chunk;
    match pool.allocate(request, 1) {
        Ok(_) => println!("  allocate({request}) succeeded"),
        Err(e) => println!("  allocate({request}) failed: {e}"),
    }

    Ok(())
}
