// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocation statistics for profiling and diagnostics.
//!
//! [`PoolStats`] is updated inside the pool's critical section, so a
//! snapshot is always consistent with the reservation table at the moment it
//! was taken.

/// Cumulative statistics about pool usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Allocation requests that reserved chunks.
    pub total_allocations: u64,
    /// Zero-byte requests answered with the sentinel pointer.
    pub zero_sized_allocations: u64,
    /// Requests that found no suitable run.
    pub failed_allocations: u64,
    /// Deallocations that freed chunks.
    pub total_deallocations: u64,
    /// Chunks reserved right now.
    pub reserved_chunks: usize,
    /// High-water mark of `reserved_chunks`.
    pub peak_reserved_chunks: usize,
    /// Sum of bytes requested by successful allocations.
    pub cumulative_requested_bytes: u64,
    /// Extra chunks reserved because alignment pushed a request across a
    /// chunk boundary.
    pub padding_chunks: u64,
}

impl PoolStats {
    /// Fraction of non-zero requests that failed, in `[0.0, 1.0]`.
    pub fn failure_ratio(&self) -> f64 {
        let attempts = self.total_allocations + self.failed_allocations;
        if attempts == 0 {
            return 0.0;
        }
        self.failed_allocations as f64 / attempts as f64
    }

    pub(crate) fn record_allocation(&mut self, bytes: usize, chunks: usize, min_chunks: usize) {
        self.total_allocations += 1;
        self.cumulative_requested_bytes += bytes as u64;
        self.padding_chunks += chunks.saturating_sub(min_chunks) as u64;
        self.reserved_chunks += chunks;
        self.peak_reserved_chunks = self.peak_reserved_chunks.max(self.reserved_chunks);
    }

    pub(crate) fn record_zero_sized(&mut self) {
        self.zero_sized_allocations += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    /// `reserved_now` is recounted from the table, since frees are trusted
    /// and may cover chunks that were already free.
    pub(crate) fn record_deallocation(&mut self, reserved_now: usize) {
        self.total_deallocations += 1;
        self.reserved_chunks = reserved_now;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Allocations: {} ok, {} zero-sized, {} failed ({:.0}% failure), \
             {} deallocations, {} chunks reserved (peak {}), {} padding chunks",
            self.total_allocations,
            self.zero_sized_allocations,
            self.failed_allocations,
            self.failure_ratio() * 100.0,
            self.total_deallocations,
            self.reserved_chunks,
            self.peak_reserved_chunks,
            self.padding_chunks,
        )
    }
}
