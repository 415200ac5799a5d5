// SPDX-License-Identifier: Apache-2.0

//! Bump-pointer arena.
//!
//! Memory is handed out from a chain of large blocks by bumping an offset.
//! There is no per-allocation free: a whole tree of values is released by
//! dropping (or [`reset`](Arena::reset)ting) the arena, which touches each
//! block once instead of every node.
//!
//! Values placed in the arena are never dropped. Anything that owns heap
//! memory and is moved into arena storage leaks that memory, which is safe
//! but wasteful, so arena-backed trees should only hold arena-backed children.

use alloc::alloc::{alloc, dealloc, Layout};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::ptr::NonNull;

use crate::alloc_stats::AllocObserver;

/// Size of a regular block: 1 MiB.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;
/// Every allocation is aligned to, and padded to a multiple of, this many bytes.
pub const ALIGNMENT: usize = 8;

/// The global allocator could not provide a new block, or the requested
/// size cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("arena allocation failed")
    }
}

/// Arena construction options.
#[derive(Clone)]
pub struct ArenaConfig {
    /// Capacity of regular blocks. Oversized requests get a block of their own.
    /// Rounded up to [`ALIGNMENT`]; a size that cannot be rounded falls back to
    /// [`DEFAULT_BLOCK_SIZE`].
    pub block_size: usize,
    /// Notified whenever a block is allocated or released.
    pub observer: Option<Arc<dyn AllocObserver>>,
}

impl ArenaConfig {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AllocObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            observer: None,
        }
    }
}

impl core::fmt::Debug for ArenaConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArenaConfig")
            .field("block_size", &self.block_size)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

struct Block {
    data: NonNull<u8>,
    capacity: usize,
    used: Cell<usize>,
}

impl Block {
    fn new(capacity: usize) -> Result<Self, AllocError> {
        let layout = Layout::from_size_align(capacity, ALIGNMENT).map_err(|_| AllocError)?;
        if layout.size() == 0 {
            return Err(AllocError);
        }
        // SAFETY: the layout has a non-zero size.
        let data = NonNull::new(unsafe { alloc(layout) }).ok_or(AllocError)?;
        Ok(Self {
            data,
            capacity,
            used: Cell::new(0),
        })
    }

    /// Carves `size` bytes aligned to `align` out of the free tail of the block.
    /// Returns the pointer and the number of bytes consumed including padding.
    fn bump(&self, size: usize, align: usize) -> Option<(NonNull<u8>, usize)> {
        let used = self.used.get();
        let base = self.data.as_ptr() as usize;
        let start = base
            .checked_add(used)?
            .checked_next_multiple_of(align)?
            .checked_sub(base)?;
        let end = start.checked_add(size)?;
        if end > self.capacity {
            return None;
        }
        self.used.set(end);
        // SAFETY: start <= end <= capacity, so the offset stays inside the allocation.
        let ptr = unsafe { NonNull::new_unchecked(self.data.as_ptr().add(start)) };
        Some((ptr, end - used))
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `data` was allocated in `Block::new` with exactly this layout.
        unsafe {
            dealloc(
                self.data.as_ptr(),
                Layout::from_size_align_unchecked(self.capacity, ALIGNMENT),
            )
        }
    }
}

/// A bump-pointer memory pool.
///
/// Allocation takes `&self`, so any number of values can borrow the arena at
/// once; [`reset`](Arena::reset) takes `&mut self`, which the borrow checker
/// only allows once every value allocated from the arena is gone.
pub struct Arena {
    blocks: RefCell<Vec<Block>>,
    current: Cell<usize>,
    block_size: usize,
    bytes_used: Cell<usize>,
    bytes_allocated: Cell<usize>,
    observer: Option<Arc<dyn AllocObserver>>,
}

impl Arena {
    /// Creates an arena seeded with one [`DEFAULT_BLOCK_SIZE`] block.
    ///
    /// If the seed block cannot be allocated the arena starts empty and the
    /// first allocation retries.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Like [`new`](Self::new) but reports a failed seed allocation.
    pub fn try_new() -> Result<Self, AllocError> {
        let arena = Self::new();
        if arena.block_count() == 0 {
            return Err(AllocError);
        }
        Ok(arena)
    }

    pub fn with_block_size(block_size: usize) -> Self {
        Self::with_config(ArenaConfig::default().with_block_size(block_size))
    }

    pub fn with_config(config: ArenaConfig) -> Self {
        let block_size = match config.block_size.max(ALIGNMENT).checked_next_multiple_of(ALIGNMENT) {
            Some(block_size) => block_size,
            None => {
                log::debug!(
                    "arena block size {} overflows, using {}",
                    config.block_size,
                    DEFAULT_BLOCK_SIZE
                );
                DEFAULT_BLOCK_SIZE
            }
        };
        let arena = Self {
            blocks: RefCell::new(Vec::new()),
            current: Cell::new(0),
            block_size,
            bytes_used: Cell::new(0),
            bytes_allocated: Cell::new(0),
            observer: config.observer,
        };
        match Block::new(block_size) {
            Ok(block) => arena.adopt(&mut arena.blocks.borrow_mut(), block),
            Err(_) => log::debug!("arena seed block of {} bytes unavailable", block_size),
        }
        arena
    }

    /// Returns `size` bytes aligned to [`ALIGNMENT`].
    ///
    /// The memory is not zeroed. The pointer stays valid until the arena is
    /// reset or dropped.
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        self.alloc_layout(Layout::from_size_align(size, ALIGNMENT).map_err(|_| AllocError)?)
    }

    /// Returns memory fitting `layout`, aligned to at least [`ALIGNMENT`].
    pub fn alloc_layout(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let align = layout.align().max(ALIGNMENT);
        let size = layout
            .size()
            .checked_next_multiple_of(ALIGNMENT)
            .ok_or(AllocError)?;

        let mut blocks = self.blocks.borrow_mut();
        let mut index = self.current.get();
        while let Some(block) = blocks.get(index) {
            if let Some((ptr, consumed)) = block.bump(size, align) {
                self.current.set(index);
                self.bytes_used.set(self.bytes_used.get() + consumed);
                return Ok(ptr);
            }
            index += 1;
        }

        // Oversized requests get a dedicated block with room for alignment padding
        let capacity = size
            .checked_add(align - ALIGNMENT)
            .ok_or(AllocError)?
            .max(self.block_size);
        let block = Block::new(capacity)?;
        self.adopt(&mut blocks, block);
        let (ptr, consumed) = blocks
            .last()
            .and_then(|block| block.bump(size, align))
            .ok_or(AllocError)?;
        self.bytes_used.set(self.bytes_used.get() + consumed);
        Ok(ptr)
    }

    /// Copies `text` into the arena.
    pub fn alloc_str(&self, text: &str) -> Result<&str, AllocError> {
        if text.is_empty() {
            return Ok("");
        }
        let ptr = self.alloc_layout(Layout::for_value(text.as_bytes()))?;
        // SAFETY: `ptr` points to at least `text.len()` freshly reserved bytes that
        // nothing else references, and the copied bytes are valid UTF-8.
        unsafe {
            core::ptr::copy_nonoverlapping(text.as_ptr(), ptr.as_ptr(), text.len());
            let bytes = core::slice::from_raw_parts(ptr.as_ptr(), text.len());
            Ok(core::str::from_utf8_unchecked(bytes))
        }
    }

    /// Allocates a slice of `len` values produced by `fill`.
    ///
    /// The values are never dropped.
    pub fn alloc_slice_fill_with<T, F>(
        &self,
        len: usize,
        mut fill: F,
    ) -> Result<&mut [T], AllocError>
    where
        F: FnMut(usize) -> T,
    {
        if len == 0 {
            return Ok(&mut []);
        }
        let layout = Layout::array::<T>(len).map_err(|_| AllocError)?;
        let ptr = self.alloc_layout(layout)?.cast::<T>();
        // SAFETY: the region is freshly reserved, aligned for `T` and large enough
        // for `len` values; every element is written before the slice is formed.
        unsafe {
            for index in 0..len {
                ptr.as_ptr().add(index).write(fill(index));
            }
            Ok(core::slice::from_raw_parts_mut(ptr.as_ptr(), len))
        }
    }

    /// Marks every block empty without returning memory to the system.
    pub fn reset(&mut self) {
        for block in self.blocks.get_mut().iter() {
            block.used.set(0);
        }
        self.current.set(0);
        self.bytes_used.set(0);
        log::debug!(
            "arena reset, keeping {} blocks ({} bytes)",
            self.block_count(),
            self.bytes_allocated()
        );
    }

    /// Bytes handed out since creation or the last reset, including padding.
    pub fn bytes_used(&self) -> usize {
        self.bytes_used.get()
    }

    /// Bytes obtained from the global allocator.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated.get()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn adopt(&self, blocks: &mut Vec<Block>, block: Block) {
        log::debug!(
            "arena block #{} of {} bytes",
            blocks.len() + 1,
            block.capacity
        );
        self.bytes_allocated
            .set(self.bytes_allocated.get() + block.capacity);
        if let Some(observer) = &self.observer {
            observer.block_allocated(block.capacity);
        }
        blocks.push(block);
        self.current.set(blocks.len() - 1);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        if let Some(observer) = &self.observer {
            for block in self.blocks.get_mut().iter() {
                observer.block_released(block.capacity);
            }
        }
    }
}

impl core::fmt::Debug for Arena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("blocks", &self.block_count())
            .field("bytes_used", &self.bytes_used())
            .field("bytes_allocated", &self.bytes_allocated())
            .finish()
    }
}
