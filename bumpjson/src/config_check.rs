// SPDX-License-Identifier: Apache-2.0

//! Compile-time configuration validation
//!
//! Checks that the allocation constants agree with each other, so a bad edit
//! fails the build instead of producing misaligned or unreachable storage.

use crate::arena::{ALIGNMENT, DEFAULT_BLOCK_SIZE};
use crate::parser::DEFAULT_MAX_DEPTH;
use crate::value::{Value, ARRAY_MIN_CAPACITY, OBJECT_MIN_CAPACITY};

const _: () = assert!(
    ALIGNMENT.is_power_of_two(),
    "arena ALIGNMENT must be a power of two"
);

const _: () = assert!(
    DEFAULT_BLOCK_SIZE % ALIGNMENT == 0 && DEFAULT_BLOCK_SIZE > 0,
    "DEFAULT_BLOCK_SIZE must be a non-zero multiple of ALIGNMENT"
);

// Values are placed in arena slots aligned to ALIGNMENT
const _: () = assert!(
    core::mem::align_of::<Value<'static>>() <= ALIGNMENT,
    "Value alignment exceeds arena ALIGNMENT"
);

// Bucket indices are computed by masking with capacity - 1
const _: () = assert!(
    OBJECT_MIN_CAPACITY.is_power_of_two(),
    "hash table minimum capacity must be a power of two"
);

const _: () = assert!(
    ARRAY_MIN_CAPACITY >= 4,
    "array minimum capacity must be at least 4"
);

const _: () = assert!(DEFAULT_MAX_DEPTH > 0, "DEFAULT_MAX_DEPTH must allow one level");
