// SPDX-License-Identifier: Apache-2.0

// Array and object behavior through the public API

use bumpjson::{
    unescape, Arena, Array, HashTable, InsertError, Object, Value, OBJECT_MIN_CAPACITY,
};
use test_log::test;

#[test]
fn test_push_then_pop_is_lifo() {
    let mut array = Array::new();
    for n in 0..100 {
        array.push(Value::Number(n as f64)).unwrap();
    }
    for n in (0..100).rev() {
        assert_eq!(array.pop(), Some(Value::Number(n as f64)));
    }
    assert_eq!(array.len(), 0);
    assert_eq!(array.pop(), None);
}

#[test]
fn test_pooled_push_then_pop_is_lifo() {
    let arena = Arena::with_block_size(2048);
    let mut array = Array::with_capacity_in(0, &arena).unwrap();
    for n in 0..100 {
        let text = format!("item{n}");
        array.push_in(Value::string_in(&text, &arena).unwrap(), &arena).unwrap();
    }
    let capacity = array.capacity();
    for n in (0..100).rev() {
        let expected = format!("item{n}");
        assert_eq!(array.pop().as_ref().and_then(Value::as_str), Some(expected.as_str()));
    }
    assert!(array.is_empty());
    assert_eq!(array.capacity(), capacity);
}

#[test]
fn test_one_doubling_preserves_mappings() {
    let mut table = HashTable::with_capacity(OBJECT_MIN_CAPACITY);
    let threshold = OBJECT_MIN_CAPACITY * 3 / 4 + 1;
    let keys: Vec<String> = (0..threshold).map(|n| format!("key-{n}")).collect();

    for (n, key) in keys.iter().enumerate() {
        table.insert(key, Value::Number(n as f64)).unwrap();
        let expected = if n + 1 < threshold { 8 } else { 16 };
        assert_eq!(table.capacity(), expected, "after {} keys", n + 1);
    }
    for (n, key) in keys.iter().enumerate() {
        assert_eq!(table.get(key), Some(&Value::Number(n as f64)));
    }
}

#[test]
fn test_set_get_size_and_delete() {
    let mut object = Object::new();
    let mut distinct = std::collections::HashSet::new();
    for n in 0..200 {
        let key = format!("k{}", n % 70);
        object.set(&key, Value::Number(n as f64)).unwrap();
        distinct.insert(key.clone());
        assert_eq!(object.get(&key), Some(&Value::Number(n as f64)));
        assert_eq!(object.len(), distinct.len());
    }

    let mut deleted = 0;
    for n in (0..70).step_by(5) {
        assert!(object.delete(&format!("k{n}")).is_some());
        deleted += 1;
    }
    assert_eq!(object.len(), distinct.len() - deleted);
    assert_eq!(object.iter().count(), object.len());
    assert!(!object.contains_key("k0"));
    assert!(object.contains_key("k1"));
}

#[test]
fn test_insert_and_set_differ_on_duplicates() {
    let arena = Arena::with_block_size(1024);
    let mut object = HashTable::with_capacity_in(0, &arena).unwrap();
    object.insert_in("dup", Value::Bool(true), &arena).unwrap();
    assert_eq!(
        object.insert_in("dup", Value::Bool(false), &arena),
        Err(InsertError::DuplicateKey)
    );
    assert_eq!(object.get("dup"), Some(&Value::Bool(true)));

    let previous = object.set_in("dup", Value::Bool(false), &arena).unwrap();
    assert_eq!(previous, Some(Value::Bool(true)));
    assert_eq!(object.get("dup"), Some(&Value::Bool(false)));
    assert_eq!(object.len(), 1);
}

#[test]
fn test_hand_built_tree_compares_with_parsed() {
    let mut inner = Array::new();
    inner.push(Value::from(true)).unwrap();
    inner.push(Value::Null).unwrap();
    let mut object = Object::new();
    object.insert("b", Value::from(inner)).unwrap();
    object.insert("a", Value::from(1.0)).unwrap();
    let built = Value::from(object);

    let arena = Arena::new();
    let parsed = bumpjson::parse_in(r#"{"a":1,"b":[true,null]}"#, &arena).unwrap();
    assert_eq!(built, parsed);
}

#[test]
fn test_parsed_strings_decode_on_demand() {
    let arena = Arena::new();
    let parsed = bumpjson::parse_in(r#"{"msg": "line\nbreak \u00e9"}"#, &arena).unwrap();
    let raw = parsed.get("msg").and_then(Value::as_str).unwrap();
    assert_eq!(raw, r"line\nbreak \u00e9");
    assert_eq!(unescape(raw).unwrap(), "line\nbreak é");
}
