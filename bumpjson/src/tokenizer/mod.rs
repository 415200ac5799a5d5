// SPDX-License-Identifier: Apache-2.0

//! Zero-copy tokenizer.
//!
//! Tokens are slices of the input text; nothing is allocated while scanning.
//! Malformed lexemes come back as [`TokenKind::Error`] tokens rather than as
//! a `Result`, leaving it to the parser to decide what an error token means.

mod token;

pub use token::{LexError, Token, TokenKind};

/// Pull-based tokenizer over a borrowed input buffer with one token of
/// lookahead.
#[derive(Debug, Clone)]
pub struct Tokenizer<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    peeked: Option<Token<'src>>,
}

const fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

const fn is_structural(byte: u8) -> bool {
    matches!(byte, b'{' | b'}' | b'[' | b']' | b':' | b',')
}

/// Characters allowed right after `true`, `false` or `null`.
const fn is_delimiter(byte: u8) -> bool {
    is_whitespace(byte) || is_structural(byte)
}

const fn is_utf8_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

impl<'src> Tokenizer<'src> {
    /// Creates a tokenizer positioned at line 1, column 1 of `source`.
    ///
    /// # Example
    /// ```
    /// use bumpjson::{TokenKind, Tokenizer};
    /// let mut tokenizer = Tokenizer::new(r#"{"a": 1}"#);
    /// assert_eq!(tokenizer.next_token().kind, TokenKind::LeftBrace);
    /// assert_eq!(tokenizer.next_token().lexeme, "a");
    /// ```
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    /// Creates a tokenizer from raw bytes, which must be valid UTF-8.
    pub fn from_slice(bytes: &'src [u8]) -> Result<Self, core::str::Utf8Error> {
        core::str::from_utf8(bytes).map(Self::new)
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Line and column of the cursor. After [`peek_token`](Self::peek_token)
    /// the cursor already sits past the peeked token.
    pub fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    /// Consumes and returns the next token.
    ///
    /// Once the input is exhausted every call returns an `Eof` token.
    pub fn next_token(&mut self) -> Token<'src> {
        match self.peeked.take() {
            Some(token) => token,
            None => self.scan(),
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&mut self) -> Token<'src> {
        if let Some(token) = self.peeked {
            return token;
        }
        let token = self.scan();
        self.peeked = Some(token);
        token
    }

    fn current(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied()
    }

    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.source.as_bytes().get(pos).copied()
    }

    fn slice(&self, start: usize, end: usize) -> &'src str {
        self.source.get(start..end).unwrap_or("")
    }

    /// The full character starting at `pos`, or "" at end of input.
    fn char_at(&self, pos: usize) -> &'src str {
        let width = self
            .source
            .get(pos..)
            .and_then(|rest| rest.chars().next())
            .map_or(0, char::len_utf8);
        self.slice(pos, pos.saturating_add(width))
    }

    /// Advances one byte, keeping line and column in step.
    fn bump(&mut self) {
        if let Some(byte) = self.current() {
            if byte == b'\n' {
                self.line = self.line.saturating_add(1);
                self.column = 1;
            } else if !is_utf8_continuation(byte) {
                self.column = self.column.saturating_add(1);
            }
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(is_whitespace) {
            self.bump();
        }
    }

    fn skip_digits(&mut self) {
        while self.current().is_some_and(|byte| byte.is_ascii_digit()) {
            self.bump();
        }
    }

    fn scan(&mut self) -> Token<'src> {
        self.skip_whitespace();
        let (line, column, start) = (self.line, self.column, self.pos);

        let Some(byte) = self.current() else {
            return Token::new(TokenKind::Eof, line, column, "");
        };

        let kind = match byte {
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b':' => TokenKind::Colon,
            b',' => TokenKind::Comma,
            b'"' => return self.scan_string(line, column),
            b'0'..=b'9' => return self.scan_number(line, column),
            b'-' if self.byte_at(start + 1).is_some_and(|b| b.is_ascii_digit()) => {
                return self.scan_number(line, column)
            }
            b't' => return self.scan_literal("true", TokenKind::True, line, column),
            b'f' => return self.scan_literal("false", TokenKind::False, line, column),
            b'n' => return self.scan_literal("null", TokenKind::Null, line, column),
            _ => return self.consume_error(LexError::UnexpectedCharacter, line, column),
        };
        self.bump();
        Token::new(kind, line, column, self.slice(start, self.pos))
    }

    /// Emits an error token holding the character under the cursor and steps
    /// past it.
    fn consume_error(&mut self, error: LexError, line: u32, column: u32) -> Token<'src> {
        let lexeme = self.char_at(self.pos);
        for _ in 0..lexeme.len() {
            self.bump();
        }
        Token::new(TokenKind::Error(error), line, column, lexeme)
    }

    fn scan_literal(
        &mut self,
        word: &'static str,
        kind: TokenKind,
        line: u32,
        column: u32,
    ) -> Token<'src> {
        let start = self.pos;
        let end = start.saturating_add(word.len());
        let spelled = self.source.as_bytes().get(start..end) == Some(word.as_bytes());
        if spelled && self.byte_at(end).map_or(true, is_delimiter) {
            for _ in 0..word.len() {
                self.bump();
            }
            return Token::new(kind, line, column, self.slice(start, end));
        }
        self.consume_error(LexError::InvalidLiteral, line, column)
    }

    fn scan_string(&mut self, line: u32, column: u32) -> Token<'src> {
        // Opening quote
        self.bump();
        let start = self.pos;
        loop {
            match self.current() {
                None => {
                    return Token::new(
                        TokenKind::Error(LexError::UnterminatedString),
                        self.line,
                        self.column,
                        self.slice(start, self.pos),
                    )
                }
                Some(b'"') => break,
                Some(b'\\') => {
                    // The escaped character is taken as-is, whatever it is
                    self.bump();
                    self.bump();
                }
                Some(_) => self.bump(),
            }
        }
        let end = self.pos;
        // Closing quote
        self.bump();
        Token::new(TokenKind::String, line, column, self.slice(start, end))
    }

    /// Error token for a missing digit run, positioned at the offending
    /// character, which is left unconsumed.
    fn number_error(&self) -> Token<'src> {
        Token::new(
            TokenKind::Error(LexError::InvalidNumber),
            self.line,
            self.column,
            self.char_at(self.pos),
        )
    }

    fn at_digit(&self) -> bool {
        self.current().is_some_and(|byte| byte.is_ascii_digit())
    }

    fn scan_number(&mut self, line: u32, column: u32) -> Token<'src> {
        let start = self.pos;
        if self.current() == Some(b'-') {
            self.bump();
        }

        match self.current() {
            Some(b'0') => self.bump(),
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return self.number_error(),
        }

        if self.current() == Some(b'.') {
            self.bump();
            if !self.at_digit() {
                return self.number_error();
            }
            self.skip_digits();
        }

        if matches!(self.current(), Some(b'e' | b'E')) {
            self.bump();
            if matches!(self.current(), Some(b'+' | b'-')) {
                self.bump();
            }
            if !self.at_digit() {
                return self.number_error();
            }
            self.skip_digits();
        }

        Token::new(TokenKind::Number, line, column, self.slice(start, self.pos))
    }
}

/// Yields tokens up to, but not including, `Eof`.
impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn kinds(input: &str) -> std::vec::Vec<TokenKind> {
        Tokenizer::new(input).map(|token| token.kind).collect()
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(
            kinds("{ } [ ] : ,"),
            [
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Colon,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn test_empty_input_is_eof_forever() {
        let mut tokenizer = Tokenizer::new(" \n\t ");
        for _ in 0..3 {
            let token = tokenizer.next_token();
            assert_eq!(token.kind, TokenKind::Eof);
            assert_eq!(token.lexeme, "");
        }
        assert_eq!(tokenizer.position(), (2, 3));
    }

    #[test]
    fn test_number_with_exponent() {
        let mut tokenizer = Tokenizer::new("-1.5e3");
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.lexeme, "-1.5e3");
        assert_eq!(tokenizer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_number_forms() {
        for input in ["0", "-0", "42", "3.14", "1e10", "1E+2", "2.5e-3", "-0.0"] {
            let mut tokenizer = Tokenizer::new(input);
            let token = tokenizer.next_token();
            assert_eq!(token.kind, TokenKind::Number, "input {input}");
            assert_eq!(token.lexeme, input);
        }
    }

    #[test]
    fn test_leading_zero_stops_number() {
        let mut tokenizer = Tokenizer::new("012");
        assert_eq!(tokenizer.next_token().lexeme, "0");
        assert_eq!(tokenizer.next_token().lexeme, "12");
    }

    #[test]
    fn test_missing_fraction_digits() {
        let mut tokenizer = Tokenizer::new("1.x");
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::Error(LexError::InvalidNumber));
        assert_eq!(token.lexeme, "x");
        assert_eq!(token.column, 3);
    }

    #[test]
    fn test_missing_exponent_digits_at_end() {
        let mut tokenizer = Tokenizer::new("7e+");
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::Error(LexError::InvalidNumber));
        assert_eq!(token.lexeme, "");
        assert_eq!((token.line, token.column), (1, 4));
    }

    #[test]
    fn test_lone_minus_is_unexpected() {
        let mut tokenizer = Tokenizer::new("- 1");
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::Error(LexError::UnexpectedCharacter));
        assert_eq!(token.lexeme, "-");
        assert_eq!(tokenizer.next_token().kind, TokenKind::Number);
    }

    #[test]
    fn test_keywords_need_delimiter() {
        assert_eq!(
            kinds("true false null"),
            [TokenKind::True, TokenKind::False, TokenKind::Null]
        );
        assert_eq!(kinds("[true]"), [
            TokenKind::LeftBracket,
            TokenKind::True,
            TokenKind::RightBracket
        ]);

        let mut tokenizer = Tokenizer::new("truex");
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::Error(LexError::InvalidLiteral));
        assert_eq!(token.lexeme, "t");
    }

    #[test]
    fn test_truncated_keyword() {
        let mut tokenizer = Tokenizer::new("tru");
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::Error(LexError::InvalidLiteral));
        assert_eq!(token.lexeme, "t");
    }

    #[test]
    fn test_string_keeps_raw_escapes() {
        let mut tokenizer = Tokenizer::new(r#""a\"b\\nA""#);
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.lexeme, r#"a\"b\\nA"#);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_unterminated_string() {
        let mut tokenizer = Tokenizer::new(r#""abc\""#);
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::Error(LexError::UnterminatedString));
        assert_eq!(token.lexeme, r#"abc\""#);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_unexpected_multibyte_character() {
        let mut tokenizer = Tokenizer::new("é1");
        let token = tokenizer.next_token();
        assert_eq!(token.kind, TokenKind::Error(LexError::UnexpectedCharacter));
        assert_eq!(token.lexeme, "é");
        let next = tokenizer.next_token();
        assert_eq!(next.lexeme, "1");
        assert_eq!(next.column, 2);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let input = "{\n  \"key\": [1,\n    \"two\nlines\", true]\n}";
        let tokens: std::vec::Vec<_> = Tokenizer::new(input)
            .map(|token| (token.kind, token.line, token.column))
            .collect();
        assert_eq!(
            tokens,
            [
                (TokenKind::LeftBrace, 1, 1),
                (TokenKind::String, 2, 3),
                (TokenKind::Colon, 2, 8),
                (TokenKind::LeftBracket, 2, 10),
                (TokenKind::Number, 2, 11),
                (TokenKind::Comma, 2, 12),
                (TokenKind::String, 3, 5),
                (TokenKind::Comma, 4, 7),
                (TokenKind::True, 4, 9),
                (TokenKind::RightBracket, 4, 13),
                (TokenKind::RightBrace, 5, 1),
            ]
        );
    }

    #[test]
    fn test_columns_count_characters_not_bytes() {
        let mut tokenizer = Tokenizer::new(r#""ü\é" 5"#);
        assert_eq!(tokenizer.next_token().lexeme, r"ü\é");
        let number = tokenizer.next_token();
        assert_eq!(number.column, 7);
    }

    #[test]
    fn test_peek_is_cached() {
        let mut tokenizer = Tokenizer::new("[1]");
        let peeked = tokenizer.peek_token();
        assert_eq!(peeked.kind, TokenKind::LeftBracket);
        assert_eq!(tokenizer.peek_token(), peeked);
        assert_eq!(tokenizer.next_token(), peeked);
        assert_eq!(tokenizer.next_token().kind, TokenKind::Number);
        assert_eq!(tokenizer.peek_token().kind, TokenKind::RightBracket);
        assert_eq!(tokenizer.next_token().kind, TokenKind::RightBracket);
        assert_eq!(tokenizer.peek_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_position_is_past_peeked_token() {
        let mut tokenizer = Tokenizer::new("  true ]");
        assert_eq!(tokenizer.position(), (1, 1));
        tokenizer.peek_token();
        assert_eq!(tokenizer.position(), (1, 7));
        tokenizer.next_token();
        assert_eq!(tokenizer.position(), (1, 7));
    }

    #[test]
    fn test_from_slice_rejects_invalid_utf8() {
        let mut bytes = [b'"', 0, b'"'];
        bytes[1] = 0b1000_0000;
        assert!(Tokenizer::from_slice(&bytes).is_err());
        assert!(Tokenizer::from_slice(b"[]").is_ok());
    }
}
