// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `chunk-pool stress`: concurrent random allocate/free against one pool.
//!
//! Every live allocation's byte range is registered in a shared set; a new
//! allocation that overlaps any registered range is reported as a failure.
//! Requests the pool cannot satisfy are counted, not treated as errors.

use chunk_pool::{ChunkPool, PoolConfig};
use rand::Rng;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

pub fn execute(
    config: &PoolConfig,
    threads: usize,
    iterations: usize,
    max_bytes: usize,
    json: bool,
) -> anyhow::Result<()> {
    anyhow::ensure!(threads > 0, "need at least one thread");
    anyhow::ensure!(max_bytes > 0, "max-bytes must be positive");

    let pool = ChunkPool::from_config(config)?;
    let live: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());
    let overlaps = AtomicUsize::new(0);
    let start = Instant::now();

    std::thread::scope(|s| {
        for id in 0..threads {
            let (pool, live, overlaps) = (&pool, &live, &overlaps);
            s.spawn(move || {
                worker(pool, live, overlaps, iterations, max_bytes);
                tracing::debug!(thread = id, "worker finished");
            });
        }
    });

    let elapsed = start.elapsed();
    let stats = pool.stats();
    let overlaps = overlaps.load(Ordering::Relaxed);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "  {threads} threads × {iterations} ops in {:.1} ms",
            elapsed.as_secs_f64() * 1000.0
        );
        println!("  Overlaps:     {overlaps}");
        println!("  Leftover:     {} chunks", pool.reserved_chunks());
        println!("{}", stats.summary());
    }

    anyhow::ensure!(overlaps == 0, "{overlaps} overlapping allocations detected");
    anyhow::ensure!(
        pool.reserved_chunks() == 0,
        "{} chunks still reserved after all frees",
        pool.reserved_chunks()
    );
    Ok(())
}

fn worker(
    pool: &ChunkPool,
    live: &Mutex<Vec<(usize, usize)>>,
    overlaps: &AtomicUsize,
    iterations: usize,
    max_bytes: usize,
) {
    let mut rng = rand::thread_rng();
    let mut mine: Vec<(NonNull<u8>, usize, usize)> = Vec::new();

    for _ in 0..iterations {
        if !mine.is_empty() && rng.gen_bool(0.5) {
            let (p, bytes, align) = mine.swap_remove(rng.gen_range(0..mine.len()));
            release(pool, live, p, bytes, align);
            continue;
        }

        let bytes = rng.gen_range(1..=max_bytes);
        let align = 1usize << rng.gen_range(0..7u32);
        let Ok(p) = pool.allocate(bytes, align) else {
            continue;
        };

        let start = p.as_ptr() as usize;
        let end = start + bytes;
        let mut ranges = live.lock().unwrap_or_else(|e| e.into_inner());
        if ranges.iter().any(|&(s, e)| start < e && s < end) {
            overlaps.fetch_add(1, Ordering::Relaxed);
            tracing::error!("overlap at {start:#x}..{end:#x}");
        }
        ranges.push((start, end));
        drop(ranges);

        mine.push((p, bytes, align));
    }

    for (p, bytes, align) in mine {
        release(pool, live, p, bytes, align);
    }
}

fn release(
    pool: &ChunkPool,
    live: &Mutex<Vec<(usize, usize)>>,
    p: NonNull<u8>,
    bytes: usize,
    align: usize,
) {
    let start = p.as_ptr() as usize;
    live.lock()
        .unwrap_or_else(|e| e.into_inner())
        .retain(|&(s, _)| s != start);
    // SAFETY: `(p, bytes)` came from `allocate` in this worker and is only
    // released once, after its range leaves the live set.
    unsafe { pool.deallocate(p.as_ptr(), bytes, align) };
}
