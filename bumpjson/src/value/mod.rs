// SPDX-License-Identifier: Apache-2.0

//! The parsed value tree.
//!
//! Containers own their children by value. A tree built by the parser keeps
//! all of its storage in the parser's [`Arena`]; trees built by hand live on
//! the heap. Dropping any tree releases whatever heap memory it owns, even
//! when that is reachable only through arena-backed containers.

use alloc::borrow::Cow;
use alloc::string::String;
use core::cmp::Ordering;

use crate::arena::{AllocError, Arena};

mod array;
mod hash_table;
mod slots;

pub use array::{Array, MIN_CAPACITY as ARRAY_MIN_CAPACITY};
pub use hash_table::{
    fnv1a, Entry, HashTable, InsertError, Iter as EntryIter, Keys,
    MIN_CAPACITY as OBJECT_MIN_CAPACITY,
};

/// JSON objects are hash tables.
pub type Object<'a> = HashTable<'a>;

/// A JSON value.
///
/// Strings hold the text exactly as it appeared between the quotes, escape
/// sequences included; see [`unescape`](crate::unescape) for decoding.
#[derive(Debug, Default)]
pub enum Value<'a> {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Cow<'a, str>),
    Array(Array<'a>),
    Object(HashTable<'a>),
}

/// The tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl<'a> Value<'a> {
    /// A string value owning a copy of `text`.
    pub fn string(text: &str) -> Self {
        Value::String(Cow::Owned(String::from(text)))
    }

    /// A string value whose text is copied into `arena`.
    pub fn string_in(text: &str, arena: &'a Arena) -> Result<Self, AllocError> {
        Ok(Value::String(Cow::Borrowed(arena.alloc_str(text)?)))
    }

    pub fn array() -> Self {
        Value::Array(Array::new())
    }

    pub fn array_with_capacity(capacity: usize) -> Self {
        Value::Array(Array::with_capacity(capacity))
    }

    pub fn array_in(capacity: usize, arena: &'a Arena) -> Result<Self, AllocError> {
        Ok(Value::Array(Array::with_capacity_in(capacity, arena)?))
    }

    pub fn object() -> Self {
        Value::Object(HashTable::new())
    }

    pub fn object_with_capacity(capacity: usize) -> Self {
        Value::Object(HashTable::with_capacity(capacity))
    }

    pub fn object_in(capacity: usize, arena: &'a Arena) -> Result<Self, AllocError> {
        Ok(Value::Object(HashTable::with_capacity_in(capacity, arena)?))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array<'a>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array<'a>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HashTable<'a>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut HashTable<'a>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Looks up `key` when this value is an object.
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.as_object()?.get(key)
    }

    /// Type-directed comparison.
    ///
    /// Values of different kinds are unordered (`None`). Arrays must have the
    /// same length and are ordered by their first differing element. Objects
    /// are only ever equal (same size, every key mapping to an equal value) or
    /// unordered; key order does not matter.
    pub fn compare(&self, other: &Value<'_>) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return None;
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        unequal => return Some(unequal),
                    }
                }
                Some(Ordering::Equal)
            }
            (Value::Object(a), Value::Object(b)) => {
                if a.len() != b.len() {
                    return None;
                }
                let all_equal = a.iter().all(|entry| {
                    b.get(entry.key())
                        .and_then(|other| entry.value().compare(other))
                        == Some(Ordering::Equal)
                });
                all_equal.then_some(Ordering::Equal)
            }
            _ => None,
        }
    }
}

impl PartialEq<Value<'_>> for Value<'_> {
    fn eq(&self, other: &Value<'_>) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd<Value<'_>> for Value<'_> {
    fn partial_cmp(&self, other: &Value<'_>) -> Option<Ordering> {
        self.compare(other)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::String(Cow::Borrowed(s))
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }
}

impl<'a> From<Array<'a>> for Value<'a> {
    fn from(array: Array<'a>) -> Self {
        Value::Array(array)
    }
}

impl<'a> From<HashTable<'a>> for Value<'a> {
    fn from(object: HashTable<'a>) -> Self {
        Value::Object(object)
    }
}
