// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-chunk reservation state.
//!
//! The [`ReservationTable`] keeps one bit per chunk: set means reserved,
//! clear means free. It knows nothing about addresses or alignment; the
//! [`ChunkPool`](crate::ChunkPool) translates byte requests into chunk
//! ranges and calls into the table while holding its mutex. The table itself
//! performs no locking.

use fixedbitset::FixedBitSet;

/// Free/reserved flags for every chunk of an arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationTable {
    bits: FixedBitSet,
}

impl ReservationTable {
    /// Creates a table of `chunk_count` chunks, all free.
    pub fn new(chunk_count: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(chunk_count),
        }
    }

    /// Number of chunks tracked.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the table tracks no chunks.
    pub fn is_empty(&self) -> bool {
        self.bits.len() == 0
    }

    /// Returns `true` if chunk `index` is reserved.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn is_reserved(&self, index: usize) -> bool {
        assert!(index < self.len(), "chunk {index} out of range");
        self.bits.contains(index)
    }

    /// First-fit search: lowest start index of a run of at least `min_count`
    /// consecutive free chunks.
    pub fn find_free_run(&self, min_count: usize) -> Option<usize> {
        self.find_free_run_from(0, min_count)
    }

    /// Like [`find_free_run`](Self::find_free_run), but ignores runs starting
    /// before chunk `from`.
    pub fn find_free_run_from(&self, from: usize, min_count: usize) -> Option<usize> {
        let len = self.len();
        if min_count == 0 {
            return (from <= len).then_some(from);
        }

        let mut run_start = from;
        let mut run_len = 0;
        for index in from..len {
            if self.bits.contains(index) {
                run_len = 0;
                run_start = index + 1;
                // Not enough chunks left for any run starting past here.
                if len - run_start < min_count {
                    return None;
                }
                continue;
            }
            run_len += 1;
            if run_len == min_count {
                return Some(run_start);
            }
        }
        None
    }

    /// Returns `true` if every chunk in `[begin, end)` is free.
    ///
    /// Ranges reaching past the end of the table are never free.
    pub fn is_range_free(&self, begin: usize, end: usize) -> bool {
        if end > self.len() || begin > end {
            return false;
        }
        self.bits.count_ones(begin..end) == 0
    }

    /// Marks `[begin, end)` reserved. All chunks must currently be free.
    pub fn reserve_range(&mut self, begin: usize, end: usize) {
        debug_assert!(
            self.is_range_free(begin, end),
            "reserving chunks {begin}..{end} that are not all free"
        );
        self.bits.set_range(begin..end, true);
    }

    /// Marks `[begin, end)` free without checking prior state.
    pub fn free_range(&mut self, begin: usize, end: usize) {
        self.bits.set_range(begin..end, false);
    }

    /// Number of reserved chunks.
    pub fn reserved_count(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Number of free chunks.
    pub fn free_count(&self) -> usize {
        self.len() - self.reserved_count()
    }

    /// Length of the longest run of consecutive free chunks.
    pub fn largest_free_run(&self) -> usize {
        let mut best = 0;
        let mut current = 0;
        for index in 0..self.len() {
            if self.bits.contains(index) {
                current = 0;
            } else {
                current += 1;
                best = best.max(current);
            }
        }
        best
    }

    /// Iterates over the reserved flag of every chunk, in index order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(move |index| self.bits.contains(index))
    }
}
