// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The fixed byte region backing a pool.
//!
//! An [`Arena`] is allocated exactly once, zero-filled, and released when it
//! is dropped. It never grows or moves, so pointers handed out by the pool
//! stay valid until the pool itself goes away.

use crate::PoolError;
use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Owned, fixed-size, aligned byte storage.
pub struct Arena {
    base: NonNull<u8>,
    layout: Layout,
}

impl Arena {
    /// Allocates `len` zeroed bytes whose base address is a multiple of
    /// `align`.
    pub fn new(len: usize, align: usize) -> Result<Self, PoolError> {
        if len == 0 {
            return Err(PoolError::InvalidGeometry(
                "arena length must be non-zero".into(),
            ));
        }
        let layout = Layout::from_size_align(len, align).map_err(|e| {
            PoolError::InvalidGeometry(format!("arena of {len} bytes aligned to {align}: {e}"))
        })?;

        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let base = NonNull::new(raw).ok_or(PoolError::ArenaAllocation { bytes: len })?;

        Ok(Self { base, layout })
    }

    /// Base pointer of the arena.
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Base address as an integer, for offset arithmetic.
    pub fn base_addr(&self) -> usize {
        self.base.as_ptr() as usize
    }

    /// Length of the arena in bytes.
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Alignment guaranteed for the base address.
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    /// Pointer to the byte at `offset`, derived from the base pointer.
    ///
    /// # Panics
    /// Panics if `offset > len()`.
    pub fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset <= self.len(), "offset {offset} past arena end");
        // SAFETY: `offset` is within (or one past) the allocation, and the
        // allocation is non-null, so the result is in bounds and non-null.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }
    }

    /// Byte offset of `ptr` from the base, or `None` if `ptr` lies outside
    /// the arena.
    pub fn offset_of(&self, ptr: *const u8) -> Option<usize> {
        let addr = ptr as usize;
        let offset = addr.checked_sub(self.base_addr())?;
        (offset < self.len()).then_some(offset)
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // SAFETY: `base` was returned by `alloc_zeroed` with this same layout
        // and is released exactly once.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
    }
}

// The arena owns its allocation outright; the raw pointer is only a handle.
unsafe impl Send for Arena {}
unsafe impl Sync for Arena {}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("base", &self.base)
            .field("len", &self.len())
            .field("align", &self.align())
            .finish()
    }
}
