// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # chunk-pool
//!
//! A fixed-capacity, chunk-granular memory pool for bounded, predictable
//! memory use. One arena is allocated up front; every later allocation is
//! carved out of it in whole chunks, so containers never touch the general
//! heap once the pool exists.
//!
//! # Key Components
//!
//! - [`ReservationTable`]: one free/reserved bit per chunk, with first-fit
//!   run search and bulk range updates.
//! - [`ChunkPool`]: the engine. Owns the arena and the table, serves
//!   `allocate(bytes, alignment)` / `deallocate(ptr, bytes, alignment)` under
//!   a single mutex.
//! - [`PoolAllocator`]: a typed, `Copy` view of a pool implementing
//!   [`allocator_api2::alloc::Allocator`], so standard-shaped containers can
//!   use it directly.
//! - [`PoolStats`]: counters for successes, failures and alignment padding.
//! - [`PoolConfig`] / [`ByteSize`]: construction-time geometry from TOML or
//!   human-readable strings.
//!
//! # Ownership Model
//!
//! ```text
//!   ChunkPool ── owns ──► Arena (fixed bytes) + Mutex<ReservationTable>
//!       ▲
//!       │ &'p borrow
//!       │
//!   PoolAllocator<'p, T>  ◄─ rebind ─►  PoolAllocator<'p, U>
//!       ▲
//!       │ A: Allocator
//!   Vec<T, PoolAllocator<'p, T>>
//! ```
//!
//! Adapters borrow the pool, so the compiler rejects any container that
//! would outlive it. There is no global pool: whoever needs one builds it and
//! lends it out.
//!
//! # Example
//! ```
//! use allocator_api2::vec::Vec;
//! use chunk_pool::{ChunkPool, PoolAllocator};
//!
//! let pool = ChunkPool::new(1000, 100).unwrap();
//!
//! let mut v = Vec::<u32, _>::new_in(PoolAllocator::<u32>::new(&pool));
//! v.extend_from_slice(&[1, 2, 3]);
//! assert_eq!(pool.reserved_chunks(), 1);
//!
//! drop(v);
//! assert_eq!(pool.reserved_chunks(), 0);
//! ```

mod adapter;
mod arena;
mod config;
mod error;
pub mod pool;
mod size;
mod stats;
mod table;

pub use adapter::{ExhaustionPolicy, PoolAllocator};
pub use config::PoolConfig;
pub use error::PoolError;
pub use pool::ChunkPool;
pub use size::ByteSize;
pub use stats::PoolStats;
pub use table::ReservationTable;
