//! Round-trip invariants on concrete values: parse ∘ render is the
//! identity on values, render ∘ parse is the identity on canonical
//! text, and strict renderings are valid JSON to outside parsers.

use refjson_core::{parse, Value};

/// Canonical compact renderings parse back to the same text.
#[test]
fn canonical_text_roundtrips() {
    for text in [
        "null",
        "true",
        "false",
        "42",
        "-13",
        "0",
        "2147483647",
        "-2147483648",
        "3.14",
        "1e12",
        "-3E-7",
        "5.67E+24",
        "-9.81e1",
        "\"hello\"",
        "\"\"",
        "[]",
        "{}",
        "[1, 2.5, \"x\", null, true]",
        "[[1], [2, 3], []]",
        "{\"a\": 1, \"b\": [1, 2], \"c\": {\"d\": null}}",
        "{\"key\": \"value with spaces\"}",
    ] {
        let value = parse(text).unwrap();
        assert_eq!(value.render().unwrap(), text, "`{text}` should round-trip");
    }
}

/// Values survive a render/parse cycle structurally.
#[test]
fn values_roundtrip_through_text() {
    let document = parse(
        r#"{"name": "suite", "versions": [1, 2, 3], "pi": 3.14159,
           "limits": {"min": -2147483648, "max": 2147483647},
           "empty": {}, "nothing": null, "on": true}"#,
    )
    .unwrap();
    let compact = parse(&document.render().unwrap()).unwrap();
    assert_eq!(compact, document);
    let pretty = parse(&document.render_pretty().unwrap()).unwrap();
    assert_eq!(pretty, document);
}

/// Real numbers keep the exact text they were written with.
#[test]
fn real_text_survives_roundtrip() {
    for text in ["1e12", "-3E-7", "5.67E+24", "-9.81e1", "0.007", "1.23e+4"] {
        let wrapped = format!("[{text}]");
        let value = parse(&wrapped).unwrap();
        assert_eq!(value.render().unwrap(), wrapped);
    }
}

/// Every named escape survives a decode/encode cycle, and `\/`
/// canonicalizes to a bare slash.
#[test]
fn escapes_roundtrip() {
    let input = r#""\"\\\/\b\f\n\r\t""#;
    let value = parse(input).unwrap();
    assert_eq!(value.as_str().unwrap(), "\"\\/\u{8}\u{c}\n\r\t");
    let rendered = value.render().unwrap();
    assert_eq!(rendered, r#""\"\\/\b\f\n\r\t""#);
    assert_eq!(parse(&rendered).unwrap(), value);
}

/// The object side index stays consistent with the entries.
#[test]
fn object_keys_stay_unique_and_indexed() {
    let value = parse(r#"{"a": 1, "b": 2, "c": 3, "d": 4}"#).unwrap();
    let object = value.as_object().unwrap();
    let keys = object.keys();
    assert_eq!(keys.len(), object.len());
    for key in &keys {
        assert!(object.get(key).is_some());
    }
    let mut unique: Vec<_> = keys.iter().map(|k| k.to_string()).collect();
    unique.dedup();
    assert_eq!(unique.len(), keys.len());
}

/// Strict renderings are plain JSON: an outside parser accepts them
/// and sees the same document in compact and pretty form.
#[test]
fn renderings_are_valid_json() {
    let document = parse(
        r#"{"text": "line\nbreak and \"quotes\"", "values": [0.5, -1, true, null],
           "nested": {"deep": [{"x": 1}, {"y": [2, 3]}]}}"#,
    )
    .unwrap();
    let compact: serde_json::Value =
        serde_json::from_str(&document.render().unwrap()).expect("compact rendering is JSON");
    let pretty: serde_json::Value =
        serde_json::from_str(&document.render_pretty().unwrap()).expect("pretty rendering is JSON");
    assert_eq!(compact, pretty);
    assert_eq!(compact["text"], "line\nbreak and \"quotes\"");
    assert_eq!(compact["values"][0], 0.5);
}

/// Unicode escapes decode to the same bytes as literal characters.
#[test]
fn unicode_escapes_match_literals() {
    let escaped = parse("\"smiley: \\u263A\"").unwrap();
    let literal = parse("\"smiley: ☺\"").unwrap();
    assert_eq!(escaped, literal);

    let pair = parse("\"pair: \\uD83D\\uDE00\"").unwrap();
    assert_eq!(pair, Value::string("pair: 😀"));
}
