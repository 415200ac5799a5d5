// SPDX-License-Identifier: Apache-2.0

//! Arena-backed JSON parsing.
//!
//! Text is split into zero-copy [`Token`]s by a [`Tokenizer`], and a
//! [`Parser`] assembles them into a [`Value`] tree whose strings, arrays and
//! objects all live in a bump-pointer [`Arena`]. Releasing the arena releases
//! the whole tree at once.
//!
//! ```
//! use bumpjson::{Arena, Parser, Tokenizer, Value};
//!
//! let arena = Arena::new();
//! let parser = Parser::with_arena(Tokenizer::new(r#"{"a":1,"b":[true,null]}"#), &arena);
//! let value = parser.parse();
//! assert!(!parser.has_error());
//! assert_eq!(value.get("a"), Some(&Value::Number(1.0)));
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Compile-time configuration validation
mod config_check;

mod alloc_stats;
pub use alloc_stats::{AllocCounters, AllocObserver, AllocStats};

mod arena;
pub use arena::{AllocError, Arena, ArenaConfig, ALIGNMENT, DEFAULT_BLOCK_SIZE};

mod escape;
pub use escape::{unescape, unescape_in, EscapeError, EscapeProcessor};

mod parse_error;
pub use parse_error::{ErrorKind, ParseError};

mod parser;
pub use parser::{parse_in, ArenaSource, Parser, DEFAULT_MAX_DEPTH};

mod tokenizer;
pub use tokenizer::{LexError, Token, TokenKind, Tokenizer};

mod value;
pub use value::{
    fnv1a, Array, Entry, EntryIter, HashTable, InsertError, Keys, Object, Value, ValueKind,
    ARRAY_MIN_CAPACITY, OBJECT_MIN_CAPACITY,
};
