// SPDX-License-Identifier: Apache-2.0

// Prints the token stream and the parsed tree for a small document.
// Run with RUST_LOG=debug to see arena activity.

use bumpjson::{Arena, ParseError, Parser, TokenKind, Tokenizer};

fn main() -> Result<(), ParseError> {
    env_logger::init();

    let json = r#"{"key": 123,   "name": "barsbold", "is_user": false, "tags": ["a", "b"]}"#;
    println!("Input: {}", json);

    for token in Tokenizer::new(json) {
        match token.kind {
            TokenKind::String | TokenKind::Number => println!(
                "{:>3}:{:<3} {:?} '{}'",
                token.line, token.column, token.kind, token.lexeme
            ),
            _ => println!("{:>3}:{:<3} {:?}", token.line, token.column, token.kind),
        }
    }

    let arena = Arena::with_block_size(4096);
    let parser = Parser::with_arena(Tokenizer::new(json), &arena);
    let value = parser.parse_document();
    if let Some(err) = parser.error() {
        return Err(err);
    }

    println!();
    println!("{:#?}", value);
    println!(
        "arena: {} bytes used of {} in {} block(s)",
        arena.bytes_used(),
        arena.bytes_allocated(),
        arena.block_count()
    );
    Ok(())
}
