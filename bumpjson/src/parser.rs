// SPDX-License-Identifier: Apache-2.0

//! Recursive-descent parser building an arena-backed [`Value`] tree.

use alloc::borrow::Cow;
use core::cell::RefCell;

use crate::arena::{Arena, ArenaConfig};
use crate::parse_error::{ErrorKind, ParseError};
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use crate::value::{Array, HashTable, Value};

/// Nesting limit used unless [`Parser::with_max_depth`] says otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 512;

mod sealed {
    pub trait Sealed {}

    impl Sealed for crate::arena::Arena {}
    impl Sealed for &crate::arena::Arena {}
}

/// Where a [`Parser`] allocates from: an [`Arena`] it owns, or a borrowed
/// `&Arena`.
pub trait ArenaSource: sealed::Sealed {
    fn arena(&self) -> &Arena;

    /// Whether dropping the parser also releases the arena.
    fn is_owned(&self) -> bool;
}

impl ArenaSource for Arena {
    fn arena(&self) -> &Arena {
        self
    }

    fn is_owned(&self) -> bool {
        true
    }
}

impl ArenaSource for &Arena {
    fn arena(&self) -> &Arena {
        self
    }

    fn is_owned(&self) -> bool {
        false
    }
}

/// Parser state that changes while tokens are consumed.
struct ParseState<'src> {
    tokenizer: Tokenizer<'src>,
    current: Option<Token<'src>>,
    error: Option<ParseError>,
    depth: usize,
    max_depth: usize,
}

/// JSON parser over a [`Tokenizer`].
///
/// Every value produced is allocated from the parser's arena. A `Parser<'src>`
/// owns its arena, so its values borrow the parser. A parser built with
/// [`with_arena`](Parser::with_arena) is a `Parser<'src, &'a Arena>` and hands
/// out `Value<'a>`, which stays usable after the parser is gone.
///
/// Errors are sticky: the first one is recorded and every later production
/// returns [`Value::Null`] without consuming input. Check
/// [`has_error`](Self::has_error) before trusting a returned value.
///
/// # Example
/// ```
/// use bumpjson::{Parser, Tokenizer};
///
/// let parser = Parser::new(Tokenizer::new(r#"{"a": [1, 2]}"#));
/// let value = parser.parse();
/// assert!(!parser.has_error());
/// assert_eq!(value.get("a").and_then(|a| a.as_array()).map(|a| a.len()), Some(2));
/// ```
pub struct Parser<'src, A: ArenaSource = Arena> {
    state: RefCell<ParseState<'src>>,
    arena: A,
}

impl<'src> Parser<'src> {
    /// Creates a parser owning a fresh default arena.
    pub fn new(tokenizer: Tokenizer<'src>) -> Self {
        Self::with_arena_config(tokenizer, ArenaConfig::default())
    }

    /// Creates a parser owning an arena built from `config`.
    pub fn with_arena_config(tokenizer: Tokenizer<'src>, config: ArenaConfig) -> Self {
        Self::from_parts(tokenizer, Arena::with_config(config))
    }

    /// Parses one value starting at the current token, priming the first
    /// token if [`advance`](Self::advance) was never called.
    pub fn parse(&self) -> Value<'_> {
        self.parse_root(&self.arena, false)
    }

    /// Like [`parse`](Self::parse), but also requires that nothing but
    /// whitespace follows the value.
    pub fn parse_document(&self) -> Value<'_> {
        self.parse_root(&self.arena, true)
    }
}

impl<'src, 'a> Parser<'src, &'a Arena> {
    /// Creates a parser allocating from a caller-owned arena.
    ///
    /// # Example
    /// ```
    /// use bumpjson::{Arena, Parser, Tokenizer, Value};
    ///
    /// fn load<'a>(text: &str, arena: &'a Arena) -> Value<'a> {
    ///     Parser::with_arena(Tokenizer::new(text), arena).parse()
    /// }
    ///
    /// let arena = Arena::new();
    /// assert_eq!(load("[1, 2]", &arena).as_array().map(|a| a.len()), Some(2));
    /// ```
    pub fn with_arena(tokenizer: Tokenizer<'src>, arena: &'a Arena) -> Self {
        Self::from_parts(tokenizer, arena)
    }

    /// Parses one value into the borrowed arena, priming the first token if
    /// [`advance`](Self::advance) was never called.
    pub fn parse(&self) -> Value<'a> {
        self.parse_root(self.arena, false)
    }

    /// Like [`parse`](Self::parse), but also requires that nothing but
    /// whitespace follows the value.
    pub fn parse_document(&self) -> Value<'a> {
        self.parse_root(self.arena, true)
    }
}

impl<'src, A: ArenaSource> Parser<'src, A> {
    fn from_parts(tokenizer: Tokenizer<'src>, arena: A) -> Self {
        Self {
            state: RefCell::new(ParseState::new(tokenizer)),
            arena,
        }
    }

    fn parse_root<'s>(&self, arena: &'s Arena, document: bool) -> Value<'s> {
        self.state.borrow_mut().parse_root(arena, document)
    }

    /// Limits how deeply arrays and objects may nest.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.state.get_mut().max_depth = max_depth;
        self
    }

    /// Pulls the next token into the current position.
    ///
    /// Nothing is pulled after an error has been recorded.
    pub fn advance(&self) {
        self.state.borrow_mut().advance();
    }

    pub fn current_token(&self) -> Option<Token<'src>> {
        self.state.borrow().current
    }

    pub fn has_error(&self) -> bool {
        self.state.borrow().error.is_some()
    }

    /// The first error encountered, if any.
    pub fn error(&self) -> Option<ParseError> {
        self.state.borrow().error
    }

    pub fn arena(&self) -> &Arena {
        self.arena.arena()
    }

    /// Whether dropping the parser also releases its arena.
    pub fn owns_arena(&self) -> bool {
        self.arena.is_owned()
    }
}

impl<A: ArenaSource> core::fmt::Debug for Parser<'_, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Parser")
            .field("current", &self.current_token())
            .field("error", &self.error())
            .field("owns_arena", &self.owns_arena())
            .finish()
    }
}

/// Parses a complete document from `text` into `arena`.
///
/// # Example
/// ```
/// use bumpjson::{parse_in, Arena};
///
/// let arena = Arena::new();
/// let value = parse_in("[true, null]", &arena).unwrap();
/// assert_eq!(value.as_array().map(|a| a.len()), Some(2));
/// assert!(parse_in("[1 2]", &arena).is_err());
/// ```
pub fn parse_in<'a>(text: &str, arena: &'a Arena) -> Result<Value<'a>, ParseError> {
    let mut state = ParseState::new(Tokenizer::new(text));
    let value = state.parse_root(arena, true);
    match state.error {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

impl<'src> ParseState<'src> {
    fn new(tokenizer: Tokenizer<'src>) -> Self {
        Self {
            tokenizer,
            current: None,
            error: None,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    fn advance(&mut self) {
        if self.error.is_none() {
            self.current = Some(self.tokenizer.next_token());
        }
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current.map(|token| token.kind)
    }

    /// Records `kind` at the current token unless an error is already set.
    ///
    /// An error token at the current position always wins over `kind`.
    fn fail(&mut self, kind: ErrorKind) {
        if self.error.is_some() {
            return;
        }
        let (kind, line, column) = match self.current {
            Some(Token {
                kind: TokenKind::Error(lex),
                line,
                column,
                ..
            }) => (ErrorKind::InvalidToken(lex), line, column),
            Some(token) => (kind, token.line, token.column),
            None => {
                let (line, column) = self.tokenizer.position();
                (kind, line, column)
            }
        };
        let err = ParseError::new(kind, line, column);
        log::debug!("{}", err);
        self.error = Some(err);
    }

    fn parse_root<'s>(&mut self, arena: &'s Arena, document: bool) -> Value<'s> {
        if self.current.is_none() {
            self.advance();
        }
        let value = self.parse_value(arena);
        if document && self.error.is_none() && self.current_kind() != Some(TokenKind::Eof) {
            self.fail(ErrorKind::TrailingCharacters);
        }
        value
    }

    fn parse_value<'s>(&mut self, arena: &'s Arena) -> Value<'s> {
        if self.error.is_some() {
            return Value::Null;
        }
        let Some(token) = self.current else {
            self.fail(ErrorKind::UnexpectedEof);
            return Value::Null;
        };

        let value = match token.kind {
            TokenKind::String => match arena.alloc_str(token.lexeme) {
                Ok(text) => Value::String(Cow::Borrowed(text)),
                Err(err) => {
                    self.fail(err.into());
                    return Value::Null;
                }
            },
            TokenKind::Number => match token.lexeme.parse::<f64>() {
                Ok(number) => Value::Number(number),
                Err(_) => {
                    self.fail(ErrorKind::InvalidNumber);
                    return Value::Null;
                }
            },
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Null => Value::Null,
            TokenKind::LeftBracket | TokenKind::LeftBrace => return self.parse_nested(arena),
            TokenKind::Eof => {
                self.fail(ErrorKind::UnexpectedEof);
                return Value::Null;
            }
            _ => {
                self.fail(ErrorKind::UnexpectedToken);
                return Value::Null;
            }
        };
        self.advance();
        value
    }

    fn parse_nested<'s>(&mut self, arena: &'s Arena) -> Value<'s> {
        if self.depth >= self.max_depth {
            self.fail(ErrorKind::MaxDepthExceeded);
            return Value::Null;
        }
        self.depth += 1;
        let value = if self.current_kind() == Some(TokenKind::LeftBracket) {
            self.parse_array(arena)
        } else {
            self.parse_object(arena)
        };
        self.depth -= 1;
        value
    }

    fn parse_array<'s>(&mut self, arena: &'s Arena) -> Value<'s> {
        // Opening bracket
        self.advance();
        let mut array = match Array::with_capacity_in(0, arena) {
            Ok(array) => array,
            Err(err) => {
                self.fail(err.into());
                return Value::Null;
            }
        };

        if self.current_kind() == Some(TokenKind::RightBracket) {
            self.advance();
            return Value::Array(array);
        }

        loop {
            let element = self.parse_value(arena);
            if self.error.is_some() {
                break;
            }
            if let Err(err) = array.push_in(element, arena) {
                self.fail(err.into());
                break;
            }
            match self.current_kind() {
                Some(TokenKind::Comma) => self.advance(),
                Some(TokenKind::RightBracket) => {
                    self.advance();
                    break;
                }
                _ => {
                    self.fail(ErrorKind::ExpectedCommaOrBracket);
                    break;
                }
            }
        }
        Value::Array(array)
    }

    fn parse_object<'s>(&mut self, arena: &'s Arena) -> Value<'s> {
        // Opening brace
        self.advance();
        let mut object = match HashTable::with_capacity_in(0, arena) {
            Ok(object) => object,
            Err(err) => {
                self.fail(err.into());
                return Value::Null;
            }
        };

        if self.current_kind() == Some(TokenKind::RightBrace) {
            self.advance();
            return Value::Object(object);
        }

        loop {
            let key = match self.current {
                Some(token) if token.kind == TokenKind::String => token.lexeme,
                _ => {
                    self.fail(ErrorKind::ExpectedKey);
                    break;
                }
            };
            self.advance();

            if self.current_kind() != Some(TokenKind::Colon) {
                self.fail(ErrorKind::ExpectedColon);
                break;
            }
            self.advance();

            let value = self.parse_value(arena);
            if self.error.is_some() {
                break;
            }
            if let Err(err) = object.set_in(key, value, arena) {
                self.fail(err.into());
                break;
            }

            match self.current_kind() {
                Some(TokenKind::Comma) => self.advance(),
                Some(TokenKind::RightBrace) => {
                    self.advance();
                    break;
                }
                _ => {
                    self.fail(ErrorKind::ExpectedCommaOrBrace);
                    break;
                }
            }
        }
        Value::Object(object)
    }
}
