// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! First-fit chunk pool over a fixed arena.
//!
//! The [`ChunkPool`] is the allocation engine. It:
//!
//! 1. Owns one [`Arena`] sized to a whole number of chunks and a
//!    [`ReservationTable`] with one flag per chunk.
//! 2. Serves `allocate(bytes, alignment)` by scanning for the lowest run of
//!    free chunks whose aligned placement fits, then reserving exactly the
//!    chunks that placement covers.
//! 3. Serves `deallocate(ptr, bytes, alignment)` by mapping the pointer back
//!    to a chunk index through its offset from the arena base.
//!
//! # Thread Safety
//! A single mutex guards the table and the statistics. Search-and-reserve
//! happens in one critical section, so two threads can never both claim the
//! same run. `ChunkPool` is `Send + Sync` and is shared by reference.
//!
//! # Failure
//! The engine never panics or aborts on exhaustion: it returns
//! [`PoolError::OutOfMemory`]. Whether that is fatal is the adapter's call.

use crate::arena::Arena;
use crate::{PoolConfig, PoolError, PoolStats, ReservationTable};
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Base alignment used when none is configured.
pub const DEFAULT_BASE_ALIGNMENT: usize = 16;

/// State mutated under the pool mutex.
#[derive(Debug)]
struct PoolState {
    table: ReservationTable,
    stats: PoolStats,
}

/// Where a request lands: byte offset into the arena plus the chunk range
/// `[first, end)` it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    offset: usize,
    first: usize,
    end: usize,
}

/// A fixed-capacity, chunk-granular memory pool.
///
/// # Example
/// ```
/// use chunk_pool::ChunkPool;
///
/// let pool = ChunkPool::new(1000, 100).unwrap();
/// assert_eq!(pool.chunk_count(), 10);
///
/// let p = pool.allocate(250, 1).unwrap();
/// assert_eq!(pool.reserved_chunks(), 3);
///
/// unsafe { pool.deallocate(p.as_ptr(), 250, 1) };
/// assert_eq!(pool.reserved_chunks(), 0);
/// ```
pub struct ChunkPool {
    arena: Arena,
    capacity: usize,
    chunk_size: usize,
    state: Mutex<PoolState>,
}

impl ChunkPool {
    /// Creates a pool of `capacity` bytes split into `chunk_size`-byte chunks,
    /// with the default base alignment.
    pub fn new(capacity: usize, chunk_size: usize) -> Result<Self, PoolError> {
        Self::with_base_alignment(capacity, chunk_size, DEFAULT_BASE_ALIGNMENT)
    }

    /// Creates a pool whose arena base is aligned to `base_alignment`.
    ///
    /// The arena is `ceil(capacity / chunk_size)` whole chunks long.
    pub fn with_base_alignment(
        capacity: usize,
        chunk_size: usize,
        base_alignment: usize,
    ) -> Result<Self, PoolError> {
        if chunk_size == 0 {
            return Err(PoolError::InvalidGeometry("chunk size must be non-zero".into()));
        }
        if capacity == 0 {
            return Err(PoolError::InvalidGeometry("capacity must be non-zero".into()));
        }
        if chunk_size > capacity {
            return Err(PoolError::InvalidGeometry(format!(
                "chunk size {chunk_size} exceeds capacity {capacity}"
            )));
        }
        if !base_alignment.is_power_of_two() {
            return Err(PoolError::InvalidGeometry(format!(
                "base alignment {base_alignment} is not a power of two"
            )));
        }

        let chunk_count = capacity.div_ceil(chunk_size);
        let arena_len = chunk_count.checked_mul(chunk_size).ok_or_else(|| {
            PoolError::InvalidGeometry(format!("{chunk_count} chunks of {chunk_size} bytes overflow"))
        })?;
        let arena = Arena::new(arena_len, base_alignment)?;

        tracing::debug!(
            capacity,
            chunk_size,
            chunk_count,
            base_alignment,
            "chunk pool created"
        );

        Ok(Self {
            arena,
            capacity,
            chunk_size,
            state: Mutex::new(PoolState {
                table: ReservationTable::new(chunk_count),
                stats: PoolStats::default(),
            }),
        })
    }

    /// Creates a pool from a [`PoolConfig`].
    pub fn from_config(config: &PoolConfig) -> Result<Self, PoolError> {
        Self::with_base_alignment(
            config.parse_capacity()?.as_bytes(),
            config.parse_chunk_size()?.as_bytes(),
            config.base_alignment,
        )
    }

    /// Allocates `bytes` bytes aligned to `alignment`.
    ///
    /// A zero-byte request reserves nothing and returns the arena base.
    /// Returns [`PoolError::InvalidAlignment`] if `alignment` is not a power
    /// of two and [`PoolError::OutOfMemory`] if no suitable run exists,
    /// whether from exhaustion or fragmentation.
    pub fn allocate(&self, bytes: usize, alignment: usize) -> Result<NonNull<u8>, PoolError> {
        if bytes == 0 {
            self.lock().stats.record_zero_sized();
            return Ok(self.arena.base());
        }
        if !alignment.is_power_of_two() {
            return Err(PoolError::InvalidAlignment(alignment));
        }

        let min_chunks = bytes.div_ceil(self.chunk_size);
        let mut state = self.lock();

        match self.find_placement(&state.table, bytes, alignment, min_chunks) {
            Some(placement) => {
                state.table.reserve_range(placement.first, placement.end);
                state
                    .stats
                    .record_allocation(bytes, placement.end - placement.first, min_chunks);
                drop(state);

                tracing::trace!(
                    bytes,
                    alignment,
                    first_chunk = placement.first,
                    end_chunk = placement.end,
                    "allocated"
                );
                Ok(self.arena.ptr_at(placement.offset))
            }
            None => {
                state.stats.record_failure();
                let err = PoolError::OutOfMemory {
                    requested_bytes: bytes,
                    alignment,
                    free_chunks: state.table.free_count(),
                    largest_free_run: state.table.largest_free_run(),
                };
                drop(state);

                tracing::debug!("allocation failed: {err}");
                Err(err)
            }
        }
    }

    /// Returns chunks previously handed out by [`allocate`](Self::allocate).
    ///
    /// A null `ptr` or zero `bytes` is a no-op. `alignment` is accepted for
    /// symmetry with `allocate` and does not affect the result.
    ///
    /// # Safety
    /// `(ptr, bytes)` must be exactly a pair returned by `allocate` on this
    /// pool that has not been deallocated since. The pool does not record
    /// allocations, so violating this silently frees chunks still in use.
    pub unsafe fn deallocate(&self, ptr: *mut u8, bytes: usize, alignment: usize) {
        let _ = alignment;
        if ptr.is_null() || bytes == 0 {
            return;
        }

        debug_assert!(
            self.contains(ptr),
            "pointer {ptr:p} does not belong to this pool"
        );
        let Some(offset) = self.arena.offset_of(ptr) else {
            return;
        };
        let (first, end) = self.covered_chunks(offset, bytes);
        let end = end.min(self.chunk_count());

        let mut state = self.lock();
        state.table.free_range(first, end);
        let reserved = state.table.reserved_count();
        state.stats.record_deallocation(reserved);
        drop(state);

        tracing::trace!(bytes, first_chunk = first, end_chunk = end, "deallocated");
    }

    /// Scans for the lowest run whose aligned placement is entirely free.
    fn find_placement(
        &self,
        table: &ReservationTable,
        bytes: usize,
        alignment: usize,
        min_chunks: usize,
    ) -> Option<Placement> {
        let base = self.arena.base_addr();
        let mut from = 0;

        while let Some(start) = table.find_free_run_from(from, min_chunks) {
            let candidate = base + start * self.chunk_size;
            let offset = align_up(candidate, alignment)? - base;

            // Later candidates start higher, so they cannot align any lower.
            if offset.checked_add(bytes)? > self.arena.len() {
                return None;
            }

            let (first, end) = self.covered_chunks(offset, bytes);
            if table.is_range_free(first, end) {
                return Some(Placement { offset, first, end });
            }

            // Any run starting at or before `first` aligns to this same
            // offset, so resume after it.
            from = first + 1;
        }
        None
    }

    /// Chunk range `[first, end)` touched by `bytes` bytes at `offset`.
    ///
    /// Both allocate and deallocate derive the range here, from the offset
    /// and the requested length, so they always agree.
    fn covered_chunks(&self, offset: usize, bytes: usize) -> (usize, usize) {
        let first = offset / self.chunk_size;
        let lead = offset % self.chunk_size;
        let span = (lead + bytes).div_ceil(self.chunk_size);
        (first, first.saturating_add(span))
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // No code path panics while the table is mid-update.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requested capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Actual arena length: `chunk_count() * chunk_size()`.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Chunk granularity in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks in the arena.
    pub fn chunk_count(&self) -> usize {
        self.arena.len() / self.chunk_size
    }

    /// Alignment of the arena base address.
    pub fn base_alignment(&self) -> usize {
        self.arena.align()
    }

    /// Arena base, which is also the zero-size sentinel.
    pub fn base_ptr(&self) -> NonNull<u8> {
        self.arena.base()
    }

    /// Returns `true` if `ptr` points into this pool's arena.
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.arena.offset_of(ptr).is_some()
    }

    /// Number of chunks currently reserved.
    pub fn reserved_chunks(&self) -> usize {
        self.lock().table.reserved_count()
    }

    /// Number of chunks currently free.
    pub fn free_chunks(&self) -> usize {
        self.lock().table.free_count()
    }

    /// Bytes held by free chunks, contiguous or not.
    pub fn free_bytes(&self) -> usize {
        self.free_chunks() * self.chunk_size
    }

    /// Length of the longest run of free chunks.
    pub fn largest_free_run(&self) -> usize {
        self.lock().table.largest_free_run()
    }

    /// `1 - largest_free_run / free_chunks`; `0.0` when nothing is free or
    /// all free chunks are contiguous.
    pub fn fragmentation(&self) -> f64 {
        let state = self.lock();
        let free = state.table.free_count();
        if free == 0 {
            return 0.0;
        }
        1.0 - state.table.largest_free_run() as f64 / free as f64
    }

    /// Snapshot of every chunk's reserved flag, in index order.
    pub fn reservation_map(&self) -> Vec<bool> {
        self.lock().table.iter().collect()
    }

    /// Snapshot of allocation statistics.
    pub fn stats(&self) -> PoolStats {
        self.lock().stats.clone()
    }
}

/// Smallest multiple of `align` (a power of two) that is `>= addr`.
fn align_up(addr: usize, align: usize) -> Option<usize> {
    addr.checked_add(align - 1).map(|a| a & !(align - 1))
}

impl std::fmt::Debug for ChunkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkPool")
            .field("capacity", &self.capacity)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_count", &self.chunk_count())
            .field("reserved_chunks", &self.reserved_chunks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(pool: &ChunkPool, p: NonNull<u8>) -> usize {
        p.as_ptr() as usize - pool.base_ptr().as_ptr() as usize
    }

    #[test]
    fn test_geometry() {
        let pool = ChunkPool::new(1000, 100).unwrap();
        assert_eq!(pool.capacity(), 1000);
        assert_eq!(pool.chunk_count(), 10);
        assert_eq!(pool.arena_len(), 1000);
        assert_eq!(pool.free_chunks(), 10);
        assert_eq!(pool.base_alignment(), DEFAULT_BASE_ALIGNMENT);
    }

    #[test]
    fn test_geometry_rounds_up_partial_chunk() {
        let pool = ChunkPool::new(1000, 300).unwrap();
        assert_eq!(pool.chunk_count(), 4);
        assert_eq!(pool.arena_len(), 1200);
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(matches!(ChunkPool::new(100, 0), Err(PoolError::InvalidGeometry(_))));
        assert!(matches!(ChunkPool::new(0, 10), Err(PoolError::InvalidGeometry(_))));
        assert!(matches!(ChunkPool::new(10, 100), Err(PoolError::InvalidGeometry(_))));
        assert!(matches!(
            ChunkPool::with_base_alignment(100, 10, 24),
            Err(PoolError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = PoolConfig {
            capacity: "2K".into(),
            chunk_size: "64".into(),
            base_alignment: 64,
            ..Default::default()
        };
        let pool = ChunkPool::from_config(&config).unwrap();
        assert_eq!(pool.chunk_count(), 32);
        assert_eq!(pool.base_ptr().as_ptr() as usize % 64, 0);
    }

    #[test]
    fn test_zero_size_returns_base() {
        let pool = ChunkPool::new(100, 10).unwrap();
        let a = pool.allocate(0, 1).unwrap();
        let b = pool.allocate(0, 4096).unwrap();
        assert_eq!(a, pool.base_ptr());
        assert_eq!(a, b);
        assert_eq!(pool.reserved_chunks(), 0);
        assert_eq!(pool.stats().zero_sized_allocations, 2);

        // Zero-length deallocation is a no-op whatever the pointer.
        let real = pool.allocate(10, 1).unwrap();
        unsafe { pool.deallocate(real.as_ptr(), 0, 1) };
        unsafe { pool.deallocate(std::ptr::null_mut(), 10, 1) };
        assert_eq!(pool.reserved_chunks(), 1);
    }

    #[test]
    fn test_invalid_alignment() {
        let pool = ChunkPool::new(100, 10).unwrap();
        assert_eq!(pool.allocate(8, 0), Err(PoolError::InvalidAlignment(0)));
        assert_eq!(pool.allocate(8, 12), Err(PoolError::InvalidAlignment(12)));
    }

    #[test]
    fn test_first_fit_order() {
        let pool = ChunkPool::new(1000, 100).unwrap();
        let a = pool.allocate(250, 1).unwrap();
        let b = pool.allocate(100, 1).unwrap();
        assert_eq!(offset(&pool, a), 0);
        assert_eq!(offset(&pool, b), 300);
        assert_eq!(
            pool.reservation_map(),
            [true, true, true, true, false, false, false, false, false, false]
        );
    }

    #[test]
    fn test_round_trip_restores_table() {
        let pool = ChunkPool::new(1000, 100).unwrap();
        let _keep = pool.allocate(150, 8).unwrap();
        let before = pool.reservation_map();

        let p = pool.allocate(420, 8).unwrap();
        assert_ne!(pool.reservation_map(), before);
        unsafe { pool.deallocate(p.as_ptr(), 420, 8) };
        assert_eq!(pool.reservation_map(), before);
    }

    #[test]
    fn test_exhaustion() {
        let pool = ChunkPool::new(100, 10).unwrap();
        let _all = pool.allocate(100, 1).unwrap();
        let err = pool.allocate(1, 1).unwrap_err();
        assert_eq!(
            err,
            PoolError::OutOfMemory {
                requested_bytes: 1,
                alignment: 1,
                free_chunks: 0,
                largest_free_run: 0,
            }
        );
        assert_eq!(pool.stats().failed_allocations, 1);
    }

    #[test]
    fn test_request_larger_than_arena() {
        let pool = ChunkPool::new(100, 10).unwrap();
        assert!(matches!(
            pool.allocate(101, 1),
            Err(PoolError::OutOfMemory { .. })
        ));
    }

    #[test]
    fn test_alignment_padding_reserves_covered_chunks() {
        // Chunks of 10 bytes: an 8-aligned placement after chunk 0 lands
        // mid-chunk and straddles a boundary.
        let pool = ChunkPool::with_base_alignment(100, 10, 16).unwrap();
        let _first = pool.allocate(3, 1).unwrap();
        let p = pool.allocate(10, 8).unwrap();

        let off = offset(&pool, p);
        assert_eq!(off, 16);
        assert_eq!(p.as_ptr() as usize % 8, 0);
        assert_eq!(pool.reservation_map()[..4], [true, true, true, false]);
        assert_eq!(pool.stats().padding_chunks, 1);

        unsafe { pool.deallocate(p.as_ptr(), 10, 8) };
        assert_eq!(pool.reserved_chunks(), 1);
    }

    #[test]
    fn test_alignment_continues_past_blocked_run() {
        let pool = ChunkPool::with_base_alignment(256, 16, 64).unwrap();
        let a = pool.allocate(16, 1).unwrap(); // chunk 0
        let b = pool.allocate(16, 1).unwrap(); // chunk 1
        let c = pool.allocate(16, 1).unwrap(); // chunk 2
        let _d = pool.allocate(16, 1).unwrap(); // chunk 3
        let e = pool.allocate(16, 1).unwrap(); // chunk 4
        unsafe {
            pool.deallocate(b.as_ptr(), 16, 1);
            pool.deallocate(c.as_ptr(), 16, 1);
        }
        // Chunks 1–2 form the first free run but are not 64-aligned; the
        // aligned candidate (chunk 4) is reserved, so the scan must continue.
        let p = pool.allocate(20, 64).unwrap();
        assert_eq!(offset(&pool, p), 128);
        assert_eq!(p.as_ptr() as usize % 64, 0);

        unsafe {
            pool.deallocate(a.as_ptr(), 16, 1);
            pool.deallocate(e.as_ptr(), 16, 1);
        }
    }

    #[test]
    fn test_alignment_beyond_arena_fails() {
        let pool = ChunkPool::with_base_alignment(64, 16, 64).unwrap();
        let _a = pool.allocate(1, 1).unwrap();
        // The next 128-aligned address is outside a 64-byte arena.
        assert!(matches!(
            pool.allocate(1, 128),
            Err(PoolError::OutOfMemory { .. })
        ));
    }

    #[test]
    fn test_fragmentation_metric() {
        let pool = ChunkPool::new(1000, 100).unwrap();
        assert_eq!(pool.fragmentation(), 0.0);

        let ptrs: Vec<_> = (0..10).map(|_| pool.allocate(100, 1).unwrap()).collect();
        assert_eq!(pool.fragmentation(), 0.0);
        for p in ptrs.iter().skip(1).step_by(2) {
            unsafe { pool.deallocate(p.as_ptr(), 100, 1) };
        }
        assert_eq!(pool.largest_free_run(), 1);
        assert!((pool.fragmentation() - 0.8).abs() < 1e-9);
        assert_eq!(pool.free_bytes(), 500);
    }

    #[test]
    fn test_contains() {
        let pool = ChunkPool::new(100, 10).unwrap();
        let p = pool.allocate(10, 1).unwrap();
        assert!(pool.contains(p.as_ptr()));
        assert!(!pool.contains(std::ptr::null()));
        let other = ChunkPool::new(100, 10).unwrap();
        assert!(!pool.contains(other.base_ptr().as_ptr()));
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), Some(0));
        assert_eq!(align_up(1, 8), Some(8));
        assert_eq!(align_up(64, 64), Some(64));
        assert_eq!(align_up(65, 64), Some(128));
        assert_eq!(align_up(usize::MAX, 2), None);
    }

    #[test]
    fn test_debug_format() {
        let pool = ChunkPool::new(1000, 100).unwrap();
        let debug = format!("{pool:?}");
        assert!(debug.contains("ChunkPool"));
        assert!(debug.contains("chunk_count: 10"));
    }
}
