// SPDX-License-Identifier: Apache-2.0

//! Decoding of JSON escape sequences.
//!
//! The tokenizer and parser keep string text exactly as written. These
//! functions turn such raw text into the string it denotes, on demand.

use alloc::borrow::Cow;
use alloc::string::String;

use crate::arena::{AllocError, Arena};

/// Why a raw string could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeError {
    /// `\` followed by a character that is not a JSON escape.
    InvalidEscapeSequence,
    /// `\u` not followed by four hexadecimal digits.
    InvalidUnicodeHex,
    /// A lone or mismatched UTF-16 surrogate.
    InvalidUnicodeCodepoint,
    /// The text ends in the middle of an escape sequence.
    TruncatedEscape,
    /// The arena could not hold the decoded text.
    OutOfMemory,
}

impl From<AllocError> for EscapeError {
    fn from(_: AllocError) -> Self {
        EscapeError::OutOfMemory
    }
}

impl core::fmt::Display for EscapeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EscapeError::InvalidEscapeSequence => f.write_str("Invalid escape sequence"),
            EscapeError::InvalidUnicodeHex => f.write_str("Invalid unicode hex sequence"),
            EscapeError::InvalidUnicodeCodepoint => f.write_str("Invalid unicode codepoint"),
            EscapeError::TruncatedEscape => f.write_str("Truncated escape sequence"),
            EscapeError::OutOfMemory => f.write_str("Out of memory"),
        }
    }
}

/// Pure helpers for the individual pieces of an escape sequence.
pub struct EscapeProcessor;

impl EscapeProcessor {
    /// Maps the character after a backslash to the character it stands for.
    ///
    /// # Examples
    /// ```
    /// use bumpjson::EscapeProcessor;
    /// assert_eq!(EscapeProcessor::process_simple_escape(b'n'), Ok('\n'));
    /// assert!(EscapeProcessor::process_simple_escape(b'x').is_err());
    /// ```
    pub fn process_simple_escape(escape_char: u8) -> Result<char, EscapeError> {
        match escape_char {
            b'n' => Ok('\n'),
            b't' => Ok('\t'),
            b'r' => Ok('\r'),
            b'\\' => Ok('\\'),
            b'"' => Ok('"'),
            b'/' => Ok('/'),
            b'b' => Ok('\u{08}'),
            b'f' => Ok('\u{0C}'),
            _ => Err(EscapeError::InvalidEscapeSequence),
        }
    }

    /// The numeric value (0-15) of a hexadecimal digit.
    pub fn validate_hex_digit(byte: u8) -> Result<u32, EscapeError> {
        match byte {
            b'0'..=b'9' => Ok(u32::from(byte - b'0')),
            b'a'..=b'f' => Ok(u32::from(byte - b'a') + 10),
            b'A'..=b'F' => Ok(u32::from(byte - b'A') + 10),
            _ => Err(EscapeError::InvalidUnicodeHex),
        }
    }

    /// Parses exactly four hex digits into a UTF-16 code unit.
    pub fn parse_hex4(hex: &[u8]) -> Result<u32, EscapeError> {
        if hex.len() != 4 {
            return Err(EscapeError::InvalidUnicodeHex);
        }
        hex.iter().try_fold(0u32, |unit, &byte| {
            Ok((unit << 4) | Self::validate_hex_digit(byte)?)
        })
    }

    /// 0xD800-0xDBFF
    pub fn is_high_surrogate(unit: u32) -> bool {
        (0xD800..=0xDBFF).contains(&unit)
    }

    /// 0xDC00-0xDFFF
    pub fn is_low_surrogate(unit: u32) -> bool {
        (0xDC00..=0xDFFF).contains(&unit)
    }

    pub fn combine_surrogate_pair(high: u32, low: u32) -> Result<char, EscapeError> {
        if !Self::is_high_surrogate(high) || !Self::is_low_surrogate(low) {
            return Err(EscapeError::InvalidUnicodeCodepoint);
        }
        let codepoint = 0x10000 + ((high & 0x3FF) << 10) + (low & 0x3FF);
        char::from_u32(codepoint).ok_or(EscapeError::InvalidUnicodeCodepoint)
    }
}

/// Walks raw string text, emitting decoded pieces to `out`.
fn decode<F>(raw: &str, mut out: F) -> Result<(), EscapeError>
where
    F: FnMut(Piece<'_>),
{
    let bytes = raw.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let run_end = bytes
            .get(pos..)
            .and_then(|rest| rest.iter().position(|&b| b == b'\\'))
            .map_or(bytes.len(), |offset| pos + offset);
        if run_end > pos {
            // Backslashes are ASCII, so both ends sit on char boundaries
            out(Piece::Text(raw.get(pos..run_end).unwrap_or("")));
            pos = run_end;
            continue;
        }

        let escape_char = *bytes.get(pos + 1).ok_or(EscapeError::TruncatedEscape)?;
        pos += 2;
        if escape_char != b'u' {
            out(Piece::Char(EscapeProcessor::process_simple_escape(escape_char)?));
            continue;
        }

        let unit = hex4_at(bytes, pos)?;
        pos += 4;
        let ch = if EscapeProcessor::is_high_surrogate(unit) {
            // A high surrogate must be followed by an escaped low surrogate
            if bytes.get(pos..pos + 2) != Some(b"\\u".as_slice()) {
                return Err(EscapeError::InvalidUnicodeCodepoint);
            }
            let low = hex4_at(bytes, pos + 2)?;
            pos += 6;
            EscapeProcessor::combine_surrogate_pair(unit, low)?
        } else {
            char::from_u32(unit).ok_or(EscapeError::InvalidUnicodeCodepoint)?
        };
        out(Piece::Char(ch));
    }
    Ok(())
}

fn hex4_at(bytes: &[u8], pos: usize) -> Result<u32, EscapeError> {
    let hex = bytes
        .get(pos..pos.saturating_add(4))
        .ok_or(EscapeError::TruncatedEscape)?;
    EscapeProcessor::parse_hex4(hex)
}

enum Piece<'r> {
    Text(&'r str),
    Char(char),
}

/// Decodes the escape sequences in `raw`.
///
/// Text without a backslash is returned borrowed.
///
/// # Example
/// ```
/// use bumpjson::unescape;
/// assert_eq!(unescape(r"tab\there").unwrap(), "tab\there");
/// assert_eq!(unescape(r"\uD83D\uDE00").unwrap(), "😀");
/// ```
pub fn unescape(raw: &str) -> Result<Cow<'_, str>, EscapeError> {
    if !raw.contains('\\') {
        return Ok(Cow::Borrowed(raw));
    }
    let mut decoded = String::with_capacity(raw.len());
    decode(raw, |piece| match piece {
        Piece::Text(text) => decoded.push_str(text),
        Piece::Char(ch) => decoded.push(ch),
    })?;
    Ok(Cow::Owned(decoded))
}

/// Decodes the escape sequences in `raw` into `arena`.
///
/// Decoding never makes text longer, so a single allocation of `raw.len()`
/// bytes is enough. Text without a backslash is copied unchanged.
pub fn unescape_in<'a>(raw: &str, arena: &'a Arena) -> Result<&'a str, EscapeError> {
    if !raw.contains('\\') {
        return Ok(arena.alloc_str(raw)?);
    }
    let buffer = arena.alloc_slice_fill_with(raw.len(), |_| 0u8)?;
    let mut len = 0;
    let mut overflow = false;
    let mut append = |bytes: &[u8]| {
        match buffer.get_mut(len..len + bytes.len()) {
            Some(dest) => {
                dest.copy_from_slice(bytes);
                len += bytes.len();
            }
            None => overflow = true,
        }
    };
    decode(raw, |piece| match piece {
        Piece::Text(text) => append(text.as_bytes()),
        Piece::Char(ch) => append(ch.encode_utf8(&mut [0; 4]).as_bytes()),
    })?;
    if overflow {
        return Err(EscapeError::OutOfMemory);
    }
    let buffer: &'a [u8] = buffer;
    let decoded = buffer.get(..len).unwrap_or(&[]);
    core::str::from_utf8(decoded).map_err(|_| EscapeError::InvalidUnicodeCodepoint)
}
