// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity backing storage shared by arrays and hash tables.
//!
//! Every slot is always initialized (unused slots hold `T::default()`), so
//! growing or shrinking is a matter of allocating a new slice and moving the
//! live prefix over with [`mem::take`].
//!
//! Dropping storage drops every slot, wherever it lives. Arena memory itself
//! is only reclaimed by the arena, but heap data owned by values kept in arena
//! slots (owned keys and strings, heap-grown children) is released here.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem;
use core::ptr;

use crate::arena::{AllocError, Arena};

pub(crate) enum Slots<'a, T> {
    /// Owned by the global allocator and freed on drop.
    Heap(Box<[T]>),
    /// Lives in an arena; the slots are dropped in place, the memory stays.
    Pooled(&'a mut [T]),
}

impl<T> Drop for Slots<'_, T> {
    fn drop(&mut self) {
        if let Slots::Pooled(slots) = self {
            // SAFETY: the slice is exclusively owned by this storage and every
            // slot is initialized. Nothing reads it after this point: the arena
            // only hands the memory out again after `reset`, which needs
            // exclusive access and so outlives every borrowing container.
            unsafe { ptr::drop_in_place::<[T]>(&mut **slots) }
        }
    }
}

impl<T> Default for Slots<'_, T> {
    fn default() -> Self {
        Slots::Heap(Box::default())
    }
}

impl<'a, T: Default> Slots<'a, T> {
    /// Infallible heap storage, aborting on allocator exhaustion like `Vec`.
    pub fn heap(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, T::default);
        Slots::Heap(slots.into_boxed_slice())
    }

    /// Storage for `capacity` slots, in `arena` when given, else on the heap.
    pub fn with_capacity(capacity: usize, arena: Option<&'a Arena>) -> Result<Self, AllocError> {
        match arena {
            Some(arena) => Ok(Slots::Pooled(
                arena.alloc_slice_fill_with(capacity, |_| T::default())?,
            )),
            None => {
                let mut slots = Vec::new();
                slots.try_reserve_exact(capacity).map_err(|_| AllocError)?;
                slots.resize_with(capacity, T::default);
                Ok(Slots::Heap(slots.into_boxed_slice()))
            }
        }
    }

    /// Replaces the storage with `capacity` fresh slots, moving the first
    /// `len` items across. On failure the current storage is untouched.
    pub fn resize(
        &mut self,
        len: usize,
        capacity: usize,
        arena: Option<&'a Arena>,
    ) -> Result<(), AllocError> {
        let mut fresh = Self::with_capacity(capacity, arena)?;
        for (to, from) in fresh
            .as_mut_slice()
            .iter_mut()
            .zip(self.as_mut_slice().iter_mut().take(len))
        {
            *to = mem::take(from);
        }
        *self = fresh;
        Ok(())
    }
}

impl<T> Slots<'_, T> {
    pub fn capacity(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self, Slots::Pooled(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Slots::Heap(slots) => &slots[..],
            Slots::Pooled(slots) => &slots[..],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Slots::Heap(slots) => &mut slots[..],
            Slots::Pooled(slots) => &mut slots[..],
        }
    }
}
