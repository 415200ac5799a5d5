// SPDX-License-Identifier: Apache-2.0

use crate::arena::AllocError;
use crate::tokenizer::LexError;

/// What went wrong while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A token that cannot start a value.
    UnexpectedToken,
    /// Input ended where a value was required.
    UnexpectedEof,
    /// The tokenizer produced an error token.
    InvalidToken(LexError),
    /// An array element was followed by something other than `,` or `]`.
    ExpectedCommaOrBracket,
    /// An object member was followed by something other than `,` or `}`.
    ExpectedCommaOrBrace,
    /// An object member did not start with a string key.
    ExpectedKey,
    /// An object key was not followed by `:`.
    ExpectedColon,
    /// A number lexeme could not be converted to `f64`.
    InvalidNumber,
    /// Arrays and objects were nested deeper than the configured limit.
    MaxDepthExceeded,
    /// Something other than whitespace followed the document.
    TrailingCharacters,
    /// The arena could not provide memory.
    OutOfMemory,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ErrorKind::UnexpectedToken => f.write_str("unexpected token"),
            ErrorKind::UnexpectedEof => f.write_str("unexpected end of input"),
            ErrorKind::InvalidToken(e) => write!(f, "invalid token: {e}"),
            ErrorKind::ExpectedCommaOrBracket => f.write_str("expected ',' or ']' in array"),
            ErrorKind::ExpectedCommaOrBrace => f.write_str("expected ',' or '}' in object"),
            ErrorKind::ExpectedKey => f.write_str("expected string key in object"),
            ErrorKind::ExpectedColon => f.write_str("expected ':'"),
            ErrorKind::InvalidNumber => f.write_str("invalid number"),
            ErrorKind::MaxDepthExceeded => f.write_str("maximum nesting depth exceeded"),
            ErrorKind::TrailingCharacters => f.write_str("trailing characters after document"),
            ErrorKind::OutOfMemory => f.write_str("out of memory"),
        }
    }
}

impl From<LexError> for ErrorKind {
    fn from(err: LexError) -> Self {
        ErrorKind::InvalidToken(err)
    }
}

impl From<AllocError> for ErrorKind {
    fn from(_: AllocError) -> Self {
        ErrorKind::OutOfMemory
    }
}

/// A syntax or resource error with the position of the token that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub const fn new(kind: ErrorKind, line: u32, column: u32) -> Self {
        Self { kind, line, column }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_display_includes_position() {
        let err = ParseError::new(ErrorKind::ExpectedCommaOrBracket, 3, 14);
        assert_eq!(
            alloc::format!("{err}"),
            "Parse error at line 3, column 14: expected ',' or ']' in array"
        );
    }

    #[test]
    fn test_lex_error_conversion() {
        let kind = ErrorKind::from(LexError::UnterminatedString);
        assert_eq!(kind, ErrorKind::InvalidToken(LexError::UnterminatedString));
        assert_eq!(
            alloc::format!("{kind}"),
            "invalid token: unterminated string"
        );
        assert_eq!(ErrorKind::from(AllocError), ErrorKind::OutOfMemory);
    }
}
