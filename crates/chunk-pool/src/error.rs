// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the chunk pool.

/// Errors that can occur while building a pool or allocating from it.
///
/// Exhaustion and fragmentation are deliberately not distinguished: both mean
/// no contiguous, suitably aligned run of free chunks exists for the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No contiguous run of free chunks can hold the request.
    #[error(
        "out of memory: requested {requested_bytes} bytes aligned to {alignment}, \
         {free_chunks} chunks free (largest run: {largest_free_run})"
    )]
    OutOfMemory {
        requested_bytes: usize,
        alignment: usize,
        free_chunks: usize,
        largest_free_run: usize,
    },

    /// The requested alignment is zero or not a power of two.
    #[error("invalid alignment {0}: must be a non-zero power of two")]
    InvalidAlignment(usize),

    /// `count * size_of::<T>()` does not fit in `usize`.
    #[error("requested element count overflows the address space")]
    CapacityOverflow,

    /// Capacity, chunk size or base alignment are inconsistent.
    #[error("invalid pool geometry: {0}")]
    InvalidGeometry(String),

    /// The one-time arena allocation failed.
    #[error("failed to allocate a {bytes}-byte arena")]
    ArenaAllocation { bytes: usize },

    /// A size string or configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
