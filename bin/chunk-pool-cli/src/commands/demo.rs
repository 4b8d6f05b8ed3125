// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `chunk-pool demo`: host containers running on a pool allocator.
//!
//! Builds a `Vec<u64>` and a vector of byte strings whose every buffer,
//! including the inner strings, comes from one pool.

use allocator_api2::vec::Vec as PoolVec;
use chunk_pool::{ChunkPool, PoolAllocator, PoolConfig};

pub fn execute(config: &PoolConfig) -> anyhow::Result<()> {
    let pool = ChunkPool::from_config(config)?;
    println!(
        "Pool: {} bytes in {} chunks of {} bytes",
        pool.arena_len(),
        pool.chunk_count(),
        pool.chunk_size()
    );
    println!();

    // ── Numbers ────────────────────────────────────────────────
    let numbers_alloc = PoolAllocator::<u64>::with_policy(&pool, config.exhaustion);
    let mut numbers = PoolVec::<u64, _>::new_in(numbers_alloc);
    numbers.extend_from_slice(&[1, 2, 3]);
    numbers.push(4);
    numbers.push(5);

    println!("  Vec<u64>:   {:?}", numbers.as_slice());
    println!("  Reserved:   {} chunks", pool.reserved_chunks());

    // ── Strings ────────────────────────────────────────────────
    let bytes_alloc = numbers_alloc.rebind::<u8>();
    let mut words = PoolVec::new_in(bytes_alloc.rebind::<PoolVec<u8, PoolAllocator<'_, u8>>>());
    for word in ["a", "b", "c", "d", "e"] {
        let mut s = PoolVec::new_in(bytes_alloc);
        s.extend_from_slice(word.as_bytes());
        words.push(s);
    }

    let rendered = words
        .iter()
        .map(|w| std::str::from_utf8(w).map(str::to_owned))
        .collect::<Result<Vec<_>, _>>()?;
    println!("  Strings:    {rendered:?}");
    println!("  Reserved:   {} chunks", pool.reserved_chunks());
    println!();

    drop(words);
    drop(numbers);
    println!("  After drop: {} chunks reserved", pool.reserved_chunks());
    println!("{}", pool.stats().summary());

    Ok(())
}
