// SPDX-License-Identifier: Apache-2.0

//! Separate-chaining hash table backing JSON objects.

use alloc::borrow::Cow;
use alloc::string::String;
use core::fmt;
use core::mem;

use super::array::over_load_factor;
use super::slots::Slots;
use super::Value;
use crate::arena::{AllocError, Arena};

/// Smallest bucket count; every capacity is a power of two.
pub const MIN_CAPACITY: usize = 8;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a.
pub fn fnv1a(key: &str) -> u32 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Why an insertion did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// The key is already present; the table was left unchanged.
    DuplicateKey,
    /// Growing the table or a bucket failed; the table was left unchanged.
    OutOfMemory,
}

impl From<AllocError> for InsertError {
    fn from(_: AllocError) -> Self {
        InsertError::OutOfMemory
    }
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::DuplicateKey => f.write_str("duplicate key"),
            InsertError::OutOfMemory => f.write_str("out of memory"),
        }
    }
}

/// A key/value pair stored in a [`HashTable`].
#[derive(Debug, Default)]
pub struct Entry<'a> {
    key: Cow<'a, str>,
    value: Value<'a>,
}

impl<'a> Entry<'a> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Length of the key in bytes.
    pub fn key_len(&self) -> usize {
        self.key.len()
    }

    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value<'a> {
        &mut self.value
    }
}

#[derive(Default)]
struct Bucket<'a> {
    entries: Slots<'a, Entry<'a>>,
    len: usize,
}

impl<'a> Bucket<'a> {
    fn entries(&self) -> &[Entry<'a>] {
        self.entries.as_slice().get(..self.len).unwrap_or(&[])
    }

    fn entries_mut(&mut self) -> &mut [Entry<'a>] {
        let len = self.len;
        self.entries.as_mut_slice().get_mut(..len).unwrap_or(&mut [])
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries().iter().position(|entry| entry.key == key)
    }

    /// Makes room for `additional` more entries, growing geometrically.
    fn reserve(&mut self, additional: usize, arena: Option<&'a Arena>) -> Result<(), AllocError> {
        let needed = self.len.checked_add(additional).ok_or(AllocError)?;
        let mut capacity = self.entries.capacity();
        if needed <= capacity {
            return Ok(());
        }
        while capacity < needed {
            capacity = capacity.checked_mul(2).ok_or(AllocError)?.max(2);
        }
        self.entries.resize(self.len, capacity, arena)
    }

    /// Appends without checking for duplicates; room must be reserved.
    fn push(&mut self, entry: Entry<'a>) -> Result<(), AllocError> {
        let slot = self
            .entries
            .as_mut_slice()
            .get_mut(self.len)
            .ok_or(AllocError)?;
        *slot = entry;
        self.len += 1;
        Ok(())
    }

    /// Swap-with-last removal.
    fn remove(&mut self, index: usize) -> Option<Entry<'a>> {
        let last = self.len.checked_sub(1)?;
        let entries = self.entries.as_mut_slice();
        if index > last {
            return None;
        }
        entries.swap(index, last);
        let entry = mem::take(entries.get_mut(last)?);
        self.len = last;
        Some(entry)
    }
}

/// Map from string keys to values with unique keys.
///
/// Heap operations (`insert`, `set`) and arena operations (`insert_in`,
/// `set_in`) can be mixed; keys inserted through an arena operation are copied
/// into the arena, the others into owned strings freed when the table drops.
pub struct HashTable<'a> {
    buckets: Slots<'a, Bucket<'a>>,
    size: usize,
}

impl Default for HashTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounds a requested capacity up to a usable power of two.
fn table_capacity(requested: usize) -> Result<usize, AllocError> {
    requested
        .max(MIN_CAPACITY)
        .checked_next_power_of_two()
        .ok_or(AllocError)
}

impl<'a> HashTable<'a> {
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Heap-backed table with at least `capacity` buckets.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = table_capacity(capacity).unwrap_or(MIN_CAPACITY);
        Self {
            buckets: Slots::heap(capacity),
            size: 0,
        }
    }

    /// Table whose buckets are allocated in `arena`.
    pub fn with_capacity_in(capacity: usize, arena: &'a Arena) -> Result<Self, AllocError> {
        Ok(Self {
            buckets: Slots::with_capacity(table_capacity(capacity)?, Some(arena))?,
            size: 0,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    pub fn is_pooled(&self) -> bool {
        self.buckets.is_pooled()
    }

    fn bucket_index(&self, key: &str) -> usize {
        // Capacity is a power of two, so masking keeps the index in range
        fnv1a(key) as usize & self.capacity().wrapping_sub(1)
    }

    fn bucket(&self, key: &str) -> Option<&Bucket<'a>> {
        self.buckets.as_slice().get(self.bucket_index(key))
    }

    fn bucket_mut(&mut self, key: &str) -> Option<&mut Bucket<'a>> {
        let index = self.bucket_index(key);
        self.buckets.as_mut_slice().get_mut(index)
    }

    /// Looks up `key`. Never allocates.
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        let bucket = self.bucket(key)?;
        let index = bucket.position(key)?;
        bucket.entries().get(index).map(Entry::value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value<'a>> {
        let bucket = self.bucket_mut(key)?;
        let index = bucket.position(key)?;
        bucket.entries_mut().get_mut(index).map(Entry::value_mut)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts a new key, copying it into an owned string.
    ///
    /// An existing key is reported as [`InsertError::DuplicateKey`] and leaves
    /// the table untouched.
    pub fn insert(&mut self, key: &str, value: Value<'a>) -> Result<(), InsertError> {
        if self.contains_key(key) {
            return Err(InsertError::DuplicateKey);
        }
        self.insert_new(Cow::Owned(String::from(key)), value, None)?;
        Ok(())
    }

    /// Like [`insert`](Self::insert), with the key and any growth placed in
    /// `arena`.
    pub fn insert_in(
        &mut self,
        key: &str,
        value: Value<'a>,
        arena: &'a Arena,
    ) -> Result<(), InsertError> {
        if self.contains_key(key) {
            return Err(InsertError::DuplicateKey);
        }
        let key = arena.alloc_str(key)?;
        self.insert_new(Cow::Borrowed(key), value, Some(arena))?;
        Ok(())
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub fn set(&mut self, key: &str, value: Value<'a>) -> Result<Option<Value<'a>>, AllocError> {
        if let Some(slot) = self.get_mut(key) {
            return Ok(Some(mem::replace(slot, value)));
        }
        self.insert_new(Cow::Owned(String::from(key)), value, None)?;
        Ok(None)
    }

    /// Like [`set`](Self::set), with a new key and any growth placed in `arena`.
    pub fn set_in(
        &mut self,
        key: &str,
        value: Value<'a>,
        arena: &'a Arena,
    ) -> Result<Option<Value<'a>>, AllocError> {
        if let Some(slot) = self.get_mut(key) {
            return Ok(Some(mem::replace(slot, value)));
        }
        let key = arena.alloc_str(key)?;
        self.insert_new(Cow::Borrowed(key), value, Some(arena))?;
        Ok(None)
    }

    /// Removes `key`, returning its value.
    pub fn delete(&mut self, key: &str) -> Option<Value<'a>> {
        let bucket = self.bucket_mut(key)?;
        let index = bucket.position(key)?;
        let entry = bucket.remove(index)?;
        self.size -= 1;
        Some(entry.value)
    }

    /// Entries in bucket order.
    pub fn iter(&self) -> Iter<'_, 'a> {
        Iter {
            buckets: self.buckets.as_slice().iter(),
            entries: Default::default(),
        }
    }

    pub fn keys(&self) -> Keys<'_, 'a> {
        Keys { inner: self.iter() }
    }

    /// Appends an entry whose key is known to be absent.
    fn insert_new(
        &mut self,
        key: Cow<'a, str>,
        value: Value<'a>,
        arena: Option<&'a Arena>,
    ) -> Result<(), AllocError> {
        let size = self.size.checked_add(1).ok_or(AllocError)?;
        if over_load_factor(size, self.capacity()) {
            let capacity = self.capacity().checked_mul(2).ok_or(AllocError)?;
            self.rehash(capacity.max(MIN_CAPACITY), arena)?;
        }

        let bucket = self.bucket_mut(&key).ok_or(AllocError)?;
        bucket.reserve(1, arena)?;
        bucket.push(Entry { key, value })?;
        self.size = size;
        Ok(())
    }

    /// Redistributes every entry into `capacity` buckets.
    ///
    /// All memory is reserved before any entry moves, so a failure leaves the
    /// table as it was.
    fn rehash(&mut self, capacity: usize, arena: Option<&'a Arena>) -> Result<(), AllocError> {
        log::trace!(
            "rehashing {} entries from {} to {} buckets",
            self.size,
            self.capacity(),
            capacity
        );
        let mask = capacity - 1;
        let mut fresh: Slots<'a, Bucket<'a>> = Slots::with_capacity(capacity, arena)?;

        // First pass: size each new bucket exactly
        let mut counts: Slots<'_, usize> = Slots::with_capacity(capacity, None)?;
        let counts = counts.as_mut_slice();
        for entry in self.iter() {
            if let Some(count) = counts.get_mut(fnv1a(entry.key()) as usize & mask) {
                *count += 1;
            }
        }
        for (bucket, &count) in fresh.as_mut_slice().iter_mut().zip(counts.iter()) {
            if count > 0 {
                bucket.reserve(count, arena)?;
            }
        }

        // Second pass: move the entries, which cannot fail anymore
        for bucket in self.buckets.as_mut_slice() {
            for entry in bucket.entries_mut() {
                let entry = mem::take(entry);
                if let Some(target) = fresh.as_mut_slice().get_mut(fnv1a(&entry.key) as usize & mask)
                {
                    target.push(entry)?;
                }
            }
            bucket.len = 0;
        }
        self.buckets = fresh;
        Ok(())
    }
}

/// Iterator over the entries of a [`HashTable`].
pub struct Iter<'s, 'a> {
    buckets: core::slice::Iter<'s, Bucket<'a>>,
    entries: core::slice::Iter<'s, Entry<'a>>,
}

impl<'s, 'a> Iterator for Iter<'s, 'a> {
    type Item = &'s Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.entries.next() {
                return Some(entry);
            }
            self.entries = self.buckets.next()?.entries().iter();
        }
    }
}

/// Iterator over the keys of a [`HashTable`].
pub struct Keys<'s, 'a> {
    inner: Iter<'s, 'a>,
}

impl<'s> Iterator for Keys<'s, '_> {
    type Item = &'s str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Entry::key)
    }
}

impl<'s, 'a> IntoIterator for &'s HashTable<'a> {
    type Item = &'s Entry<'a>;
    type IntoIter = Iter<'s, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for HashTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|entry| (entry.key(), entry.value())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(""), 0x811c_9dc5);
        assert_eq!(fnv1a("a"), 0xe40c_292c);
        assert_eq!(fnv1a("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        assert_eq!(HashTable::with_capacity(0).capacity(), 8);
        assert_eq!(HashTable::with_capacity(9).capacity(), 16);
        assert_eq!(HashTable::with_capacity(64).capacity(), 64);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut table = HashTable::new();
        table.insert("k", Value::Number(1.0)).unwrap();
        assert_eq!(
            table.insert("k", Value::Number(2.0)),
            Err(InsertError::DuplicateKey)
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("k"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_set_overwrites() {
        let mut table = HashTable::new();
        assert_eq!(table.set("k", Value::Bool(false)), Ok(None));
        assert_eq!(
            table.set("k", Value::Bool(true)),
            Ok(Some(Value::Bool(false)))
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("k"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_seventh_key_doubles_capacity() {
        let mut table = HashTable::with_capacity(8);
        let keys = ["a", "b", "c", "d", "e", "f"];
        for (n, key) in keys.iter().enumerate() {
            table.insert(key, Value::Number(n as f64)).unwrap();
        }
        assert_eq!(table.capacity(), 8);
        table.insert("g", Value::Null).unwrap();
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.len(), 7);
        for (n, key) in keys.iter().enumerate() {
            assert_eq!(table.get(key), Some(&Value::Number(n as f64)));
        }
        assert_eq!(table.get("g"), Some(&Value::Null));
    }

    #[test]
    fn test_delete_swaps_with_last() {
        let mut table = HashTable::new();
        for n in 0..40 {
            table.insert(&alloc::format!("key{n}"), Value::Number(n as f64)).unwrap();
        }
        for n in (0..40).step_by(3) {
            assert_eq!(
                table.delete(&alloc::format!("key{n}")),
                Some(Value::Number(n as f64))
            );
        }
        assert_eq!(table.delete("key0"), None);
        assert_eq!(table.len(), 26);
        for n in 0..40 {
            let found = table.get(&alloc::format!("key{n}"));
            if n % 3 == 0 {
                assert_eq!(found, None);
            } else {
                assert_eq!(found, Some(&Value::Number(n as f64)));
            }
        }
    }

    #[test]
    fn test_arena_table_keeps_keys_in_arena() {
        let arena = Arena::with_block_size(8192);
        let mut table = HashTable::with_capacity_in(0, &arena).unwrap();
        for n in 0..10 {
            table
                .insert_in(&alloc::format!("k{n}"), Value::Number(n as f64), &arena)
                .unwrap();
        }
        assert!(table.is_pooled());
        assert_eq!(table.capacity(), 16);
        assert!(table
            .iter()
            .all(|entry| matches!(entry.key, Cow::Borrowed(_))));
        assert_eq!(table.keys().count(), 10);
        assert_eq!(
            table.set_in("k3", Value::Null, &arena),
            Ok(Some(Value::Number(3.0)))
        );
    }
}
