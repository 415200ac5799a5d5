// SPDX-License-Identifier: Apache-2.0

use core::fmt;
use core::mem;
use core::ops::Index;

use super::slots::Slots;
use super::Value;
use crate::arena::{AllocError, Arena};

/// Smallest capacity an array is ever given.
pub const MIN_CAPACITY: usize = 4;

/// Growable sequence of values, stored on the heap or in an [`Arena`].
///
/// The storage kind follows whichever allocator last grew the array:
/// [`push`](Self::push) grows on the heap, [`push_in`](Self::push_in) in the
/// given arena. Arena-backed storage never shrinks.
#[derive(Default)]
pub struct Array<'a> {
    items: Slots<'a, Value<'a>>,
    len: usize,
}

/// True when storing `len` items in `capacity` slots would exceed 75% load.
pub(crate) fn over_load_factor(len: usize, capacity: usize) -> bool {
    len.saturating_mul(4) > capacity.saturating_mul(3)
}

impl<'a> Array<'a> {
    /// Heap-backed array with room for at least [`MIN_CAPACITY`] items.
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Slots::heap(capacity.max(MIN_CAPACITY)),
            len: 0,
        }
    }

    /// Array whose storage is allocated in `arena`.
    pub fn with_capacity_in(capacity: usize, arena: &'a Arena) -> Result<Self, AllocError> {
        Ok(Self {
            items: Slots::with_capacity(capacity.max(MIN_CAPACITY), Some(arena))?,
            len: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Whether the items currently live in an arena.
    pub fn is_pooled(&self) -> bool {
        self.items.is_pooled()
    }

    /// Appends `value`, doubling the heap capacity first if needed.
    pub fn push(&mut self, value: Value<'a>) -> Result<(), AllocError> {
        self.push_with(value, None)
    }

    /// Appends `value`, doubling the capacity into `arena` first if needed.
    pub fn push_in(&mut self, value: Value<'a>, arena: &'a Arena) -> Result<(), AllocError> {
        self.push_with(value, Some(arena))
    }

    fn push_with(&mut self, value: Value<'a>, arena: Option<&'a Arena>) -> Result<(), AllocError> {
        let len = self.len.checked_add(1).ok_or(AllocError)?;
        if over_load_factor(len, self.capacity()) {
            let capacity = self
                .capacity()
                .checked_mul(2)
                .ok_or(AllocError)?
                .max(MIN_CAPACITY);
            self.items.resize(self.len, capacity, arena)?;
        }
        let slot = self
            .items
            .as_mut_slice()
            .get_mut(self.len)
            .ok_or(AllocError)?;
        *slot = value;
        self.len = len;
        Ok(())
    }

    /// Removes and returns the last value, or `None` when empty.
    pub fn pop(&mut self) -> Option<Value<'a>> {
        let last = self.len.checked_sub(1)?;
        let value = mem::take(self.items.as_mut_slice().get_mut(last)?);
        self.len = last;

        let capacity = self.capacity();
        if !self.items.is_pooled() && self.len > 0 && self.len < capacity / 4 {
            let shrunk = (capacity / 2).max(MIN_CAPACITY);
            if shrunk < capacity && self.items.resize(self.len, shrunk, None).is_err() {
                log::debug!("array shrink to {} slots failed, keeping {}", shrunk, capacity);
            }
        }
        Some(value)
    }

    pub fn get(&self, index: usize) -> Option<&Value<'a>> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value<'a>> {
        self.as_mut_slice().get_mut(index)
    }

    pub fn as_slice(&self) -> &[Value<'a>] {
        self.items.as_slice().get(..self.len).unwrap_or(&[])
    }

    pub fn as_mut_slice(&mut self) -> &mut [Value<'a>] {
        let len = self.len;
        self.items.as_mut_slice().get_mut(..len).unwrap_or(&mut [])
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Value<'a>> {
        self.as_slice().iter()
    }
}

impl<'a> Index<usize> for Array<'a> {
    type Output = Value<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'s, 'a> IntoIterator for &'s Array<'a> {
    type Item = &'s Value<'a>;
    type IntoIter = core::slice::Iter<'s, Value<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Array<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
