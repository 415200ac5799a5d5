// SPDX-License-Identifier: Apache-2.0

/// Why a lexeme could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// Input ended before the closing quote of a string.
    UnterminatedString,
    /// A mandatory digit run of a number is missing.
    InvalidNumber,
    /// `t`, `f` or `n` did not spell a delimited `true`, `false` or `null`.
    InvalidLiteral,
    /// A character that cannot start any token.
    UnexpectedCharacter,
}

impl core::fmt::Display for LexError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            LexError::UnterminatedString => "unterminated string",
            LexError::InvalidNumber => "malformed number",
            LexError::InvalidLiteral => "invalid literal",
            LexError::UnexpectedCharacter => "unexpected character",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    String,
    Number,
    True,
    False,
    Null,
    Eof,
    Error(LexError),
}

impl TokenKind {
    pub fn is_error(&self) -> bool {
        matches!(self, TokenKind::Error(_))
    }
}

/// A classified slice of the input.
///
/// `lexeme` borrows the tokenizer's input, so a token can never outlive the
/// text it was scanned from. For strings it holds the raw content between the
/// quotes with escape sequences left as written. For error tokens it holds the
/// offending character, or the unterminated string content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// 1-based line of the token's first character.
    pub line: u32,
    /// 1-based column of the token's first character.
    pub column: u32,
    pub lexeme: &'src str,
}

impl<'src> Token<'src> {
    pub const fn new(kind: TokenKind, line: u32, column: u32, lexeme: &'src str) -> Self {
        Self {
            kind,
            line,
            column,
            lexeme,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}
