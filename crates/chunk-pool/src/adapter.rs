// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Typed allocator view over a [`ChunkPool`].
//!
//! A [`PoolAllocator<'p, T>`] borrows one pool and translates element counts
//! into byte sizes and alignments. It holds no state of its own, so it is
//! `Copy` and can be created wherever a container needs one. The borrow ties
//! every adapter, and every container built on it, to the pool's lifetime.
//!
//! The adapter also implements [`allocator_api2::alloc::Allocator`], so
//! `allocator_api2::vec::Vec<T, PoolAllocator<'_, T>>` and friends draw their
//! storage from the pool.

use crate::{ChunkPool, PoolError};
use allocator_api2::alloc::{AllocError, Allocator, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ptr::{self, NonNull};

/// What an adapter does when the pool cannot satisfy a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Return the error to the caller.
    #[default]
    Recoverable,
    /// Log the error and abort the process.
    Abort,
}

/// Allocator for elements of type `T`, backed by a borrowed [`ChunkPool`].
///
/// Two adapters are equal iff they borrow the same pool, whatever their
/// element types.
///
/// # Example
/// ```
/// use chunk_pool::{ChunkPool, PoolAllocator};
///
/// let pool = ChunkPool::new(1024, 16).unwrap();
/// let alloc = PoolAllocator::<u64>::new(&pool);
///
/// let p = alloc.allocate(4).unwrap();
/// assert_eq!(pool.reserved_chunks(), 2);
/// unsafe { alloc.deallocate(p, 4) };
///
/// let bytes = alloc.rebind::<u8>();
/// assert!(bytes == alloc);
/// ```
pub struct PoolAllocator<'p, T> {
    pool: &'p ChunkPool,
    policy: ExhaustionPolicy,
    _marker: PhantomData<fn() -> T>,
}

impl<'p, T> PoolAllocator<'p, T> {
    /// Binds an adapter that reports exhaustion as an error.
    pub fn new(pool: &'p ChunkPool) -> Self {
        Self::with_policy(pool, ExhaustionPolicy::Recoverable)
    }

    /// Binds an adapter with an explicit exhaustion policy.
    pub fn with_policy(pool: &'p ChunkPool, policy: ExhaustionPolicy) -> Self {
        Self {
            pool,
            policy,
            _marker: PhantomData,
        }
    }

    /// The pool this adapter draws from.
    pub fn pool(&self) -> &'p ChunkPool {
        self.pool
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    /// Adapter for another element type on the same pool, keeping the
    /// policy.
    pub fn rebind<U>(&self) -> PoolAllocator<'p, U> {
        PoolAllocator::with_policy(self.pool, self.policy)
    }

    /// Allocates storage for `n` values of `T`.
    ///
    /// Under [`ExhaustionPolicy::Abort`] a failure never returns.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, PoolError> {
        let result = n
            .checked_mul(size_of::<T>())
            .ok_or(PoolError::CapacityOverflow)
            .and_then(|bytes| self.pool.allocate(bytes, align_of::<T>()));

        match result {
            Ok(ptr) => Ok(ptr.cast()),
            Err(err) => Err(self.on_failure(err)),
        }
    }

    /// Releases storage for `n` values of `T`.
    ///
    /// # Safety
    /// `ptr` must come from [`allocate(n)`](Self::allocate) on an adapter
    /// equal to this one, with the same `n`, and not have been released.
    pub unsafe fn deallocate(&self, ptr: NonNull<T>, n: usize) {
        let bytes = n.saturating_mul(size_of::<T>());
        self.pool
            .deallocate(ptr.as_ptr().cast(), bytes, align_of::<T>());
    }

    fn on_failure(&self, err: PoolError) -> PoolError {
        if self.policy == ExhaustionPolicy::Abort {
            tracing::error!("{}: {err}", std::any::type_name::<Self>());
            std::process::abort();
        }
        err
    }
}

impl<T> Clone for PoolAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PoolAllocator<'_, T> {}

impl<'p, T> From<&'p ChunkPool> for PoolAllocator<'p, T> {
    fn from(pool: &'p ChunkPool) -> Self {
        Self::new(pool)
    }
}

impl<T, U> PartialEq<PoolAllocator<'_, U>> for PoolAllocator<'_, T> {
    fn eq(&self, other: &PoolAllocator<'_, U>) -> bool {
        ptr::eq(self.pool, other.pool)
    }
}

impl<T> Eq for PoolAllocator<'_, T> {}

impl<T> fmt::Debug for PoolAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("element", &std::any::type_name::<T>())
            .field("pool", &(self.pool as *const ChunkPool))
            .field("policy", &self.policy)
            .finish()
    }
}

// SAFETY: blocks stay valid until deallocated because the arena never moves
// and is borrowed for 'p; copies share the pool and so behave identically.
unsafe impl<T> Allocator for PoolAllocator<'_, T> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            // Containers never read through this; it only has to be aligned.
            let dangling = NonNull::new(layout.align() as *mut u8).ok_or(AllocError)?;
            return Ok(NonNull::slice_from_raw_parts(dangling, 0));
        }

        match self.pool.allocate(layout.size(), layout.align()) {
            Ok(ptr) => Ok(NonNull::slice_from_raw_parts(ptr, layout.size())),
            Err(err) => {
                self.on_failure(err);
                Err(AllocError)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.pool
            .deallocate(ptr.as_ptr(), layout.size(), layout.align());
    }
}
