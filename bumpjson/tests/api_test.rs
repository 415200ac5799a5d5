// SPDX-License-Identifier: Apache-2.0

// End-to-end checks of the public parsing API

use bumpjson::{
    parse_in, Arena, ErrorKind, LexError, Parser, TokenKind, Tokenizer, Value, ValueKind,
};
use test_log::test;

macro_rules! literal_scenarios {
    ($($name:ident: $input:expr => |$parser:ident, $value:ident| $body:block)*) => {
        $(
            paste::paste! {
                #[test]
                fn [<test_literal_ $name>]() {
                    let arena = Arena::new();
                    let $parser = Parser::with_arena(Tokenizer::new($input), &arena);
                    let $value = $parser.parse();
                    $body
                }
            }
        )*
    };
}

literal_scenarios! {
    empty_object: "{}" => |parser, value| {
        assert!(!parser.has_error());
        assert_eq!(value.kind(), ValueKind::Object);
        assert_eq!(value.as_object().unwrap().len(), 0);
    }

    number_array: "[1,2,3]" => |parser, value| {
        assert!(!parser.has_error());
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array[0], Value::Number(1.0));
        assert_eq!(array[1], Value::Number(2.0));
        assert_eq!(array[2], Value::Number(3.0));
    }

    nested_object: r#"{"a":1,"b":[true,null]}"# => |parser, value| {
        assert!(!parser.has_error());
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object.get("a"), Some(&Value::Number(1.0)));
        let b = object.get("b").and_then(Value::as_array).unwrap();
        assert_eq!(b.as_slice(), &[Value::Bool(true), Value::Null]);
    }

    missing_separator: "[1 2]" => |parser, _value| {
        assert!(parser.has_error());
        let err = parser.error().unwrap();
        assert_eq!(err.kind, ErrorKind::ExpectedCommaOrBracket);
        assert!(err.to_string().contains("expected ',' or ']'"));
    }

    truncated_true: "tru" => |parser, value| {
        assert!(parser.has_error());
        assert!(value.is_null());
        assert_eq!(
            parser.error().map(|e| e.kind),
            Some(ErrorKind::InvalidToken(LexError::InvalidLiteral))
        );
    }

    exponent_number: "-1.5e3" => |parser, value| {
        assert!(!parser.has_error());
        assert_eq!(value.as_f64(), Some(-1500.0));
    }
}

#[test]
fn test_truncated_true_is_an_error_token() {
    let mut tokenizer = Tokenizer::new("tru");
    assert!(tokenizer.next_token().kind.is_error());
}

#[test]
fn test_exponent_number_is_one_token() {
    let tokens: Vec<_> = Tokenizer::new("-1.5e3").collect();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].lexeme, "-1.5e3");
}

#[test]
fn test_literals_recovered_exactly() {
    let arena = Arena::new();
    let text = r#"[0, -0.5, 1e2, "plain", "esc\"aped\\n", true, false, null, {"kéy": "v"}]"#;
    let value = parse_in(text, &arena).unwrap();
    let items = value.as_array().unwrap();

    assert_eq!(items[0].as_f64(), Some(0.0));
    assert_eq!(items[1].as_f64(), Some(-0.5));
    assert_eq!(items[2].as_f64(), Some(100.0));
    assert_eq!(items[3].as_str(), Some("plain"));
    assert_eq!(items[4].as_str(), Some(r#"esc\"aped\\n"#));
    assert_eq!(items[5].as_bool(), Some(true));
    assert_eq!(items[6].as_bool(), Some(false));
    assert!(items[7].is_null());
    // Keys are stored raw as well
    assert_eq!(items[8].get(r"kéy").and_then(Value::as_str), Some("v"));
}

#[test]
fn test_whitespace_and_line_endings() {
    let arena = Arena::new();
    let value = parse_in("\r\n\t{ \"a\" :\r\n [ ] }\r\n", &arena).unwrap();
    assert_eq!(value.get("a").and_then(Value::as_array).map(|a| a.len()), Some(0));
}

#[test]
fn test_parse_document_and_parse_in_agree() {
    let text = r#"{"list": [1, {"deep": [null]}], "name": "x"}"#;
    let arena = Arena::new();
    let direct = parse_in(text, &arena).unwrap();

    let parser = Parser::new(Tokenizer::new(text));
    let via_parser = parser.parse_document();
    assert!(!parser.has_error());
    assert_eq!(direct, via_parser);
}

#[test]
fn test_from_slice() {
    let arena = Arena::new();
    let tokenizer = Tokenizer::from_slice(br#"{"bytes": 1}"#).unwrap();
    let parser = Parser::with_arena(tokenizer, &arena);
    let value = parser.parse();
    assert_eq!(value.get("bytes"), Some(&Value::Number(1.0)));
}

#[test]
fn test_large_document() {
    let mut text = String::from("[");
    for n in 0..2000 {
        if n > 0 {
            text.push(',');
        }
        text.push_str(&format!(r#"{{"id": {n}, "tags": ["t{n}", "u{n}"]}}"#));
    }
    text.push(']');

    let arena = Arena::with_block_size(16 * 1024);
    let value = parse_in(&text, &arena).unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 2000);
    assert!(arena.block_count() > 1);
    for (n, item) in items.iter().enumerate() {
        assert_eq!(item.get("id"), Some(&Value::Number(n as f64)));
        let tag = format!("t{n}");
        assert_eq!(
            item.get("tags").and_then(Value::as_array).and_then(|t| t[0].as_str()),
            Some(tag.as_str())
        );
    }
}

fn load<'a>(text: &str, arena: &'a Arena) -> Value<'a> {
    let parser = Parser::with_arena(Tokenizer::new(text), arena);
    let value = parser.parse_document();
    assert!(!parser.has_error(), "{:?}", parser.error());
    value
}

#[test]
fn test_values_outlive_borrowing_parser() {
    let arena = Arena::with_block_size(4096);
    let first = load(r#"{"name": "first", "list": [1, 2]}"#, &arena);
    let second = load("[true, false]", &arena);

    assert_eq!(first.get("name").and_then(Value::as_str), Some("first"));
    assert_eq!(first.get("list").and_then(Value::as_array).map(|a| a.len()), Some(2));
    assert_eq!(second.as_array().map(|a| a.len()), Some(2));
    assert!(first.as_object().unwrap().is_pooled());
}
