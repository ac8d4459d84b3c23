//! Tests for the value algebra: rendering, pretty layout, lookup
//! primitives, and the indexing toggles.

use refjson_core::error::RefJsonError;
use refjson_core::{EvalOptions, Kind, Value};

fn sample_array() -> Value {
    Value::array(vec![
        Value::Int(1),
        Value::real(1.0),
        Value::Bool(true),
        Value::string("test"),
    ])
}

fn sample_object() -> Value {
    Value::object(vec![
        ("integer".to_string(), Value::Int(42)),
        ("boolean".to_string(), Value::Bool(true)),
        ("string".to_string(), Value::string("Hello World")),
    ])
    .unwrap()
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn null_renders() {
    let value = Value::Null;
    assert_eq!(value.kind(), Kind::Null);
    assert_eq!(value.render().unwrap(), "null");
    assert_eq!(value.render_pretty().unwrap(), "null");
    assert_eq!(value.render_indented(3, true).unwrap(), "null");
}

#[test]
fn booleans_render() {
    assert_eq!(Value::Bool(true).render().unwrap(), "true");
    assert_eq!(Value::Bool(false).render().unwrap(), "false");
    assert_eq!(Value::Bool(true).kind(), Kind::Boolean);
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
}

#[test]
fn integers_render() {
    assert_eq!(Value::Int(0).render().unwrap(), "0");
    assert_eq!(Value::Int(73).render().unwrap(), "73");
    assert_eq!(Value::Int(-47).render().unwrap(), "-47");
    assert_eq!(Value::Int(i32::MAX).render().unwrap(), "2147483647");
    assert_eq!(Value::Int(i32::MIN).render().unwrap(), "-2147483648");
    assert_eq!(Value::Int(12).as_int(), Some(12));
    assert_eq!(Value::Int(12).kind(), Kind::Integer);
}

#[test]
fn type_names() {
    assert_eq!(Value::Null.type_name(), "JSON-Null");
    assert_eq!(Value::Bool(false).type_name(), "JSON-Boolean");
    assert_eq!(Value::Int(0).type_name(), "JSON-Integer");
    assert_eq!(Value::real(0.0).type_name(), "JSON-Real");
    assert_eq!(Value::string("").type_name(), "JSON-String");
    assert_eq!(Value::array(vec![]).type_name(), "JSON-Array");
    assert_eq!(Value::object(vec![]).unwrap().type_name(), "JSON-Object");
}

// ============================================================================
// Reals: fabricated vs. preserved text
// ============================================================================

#[test]
fn real_from_float_fabricates_trimmed_text() {
    assert_eq!(Value::real(0.0).render().unwrap(), "0.0");
    assert_eq!(Value::real(-273.15).render().unwrap(), "-273.149994");
    assert_eq!(Value::real(36.6).render().unwrap(), "36.599998");
    assert_eq!(Value::real(f32::EPSILON).render().unwrap(), "0.0");
    assert_eq!(
        Value::real(f32::MAX).render().unwrap(),
        "340282346638528859811704183484516925440.0"
    );
    assert_eq!(
        Value::real(f32::MIN).render().unwrap(),
        "-340282346638528859811704183484516925440.0"
    );
}

#[test]
fn real_from_text_preserves_text() {
    for text in [
        "0.0",
        "-273.15",
        "36.6",
        "1e12",
        "-3E-7",
        "5.67E+24",
        "-9.81e1",
        "3.14159",
        "2.71828",
        "0.000000",
    ] {
        let value = Value::real_from_text(text).unwrap();
        assert_eq!(value.kind(), Kind::Real);
        assert_eq!(value.render().unwrap(), text);
    }
}

#[test]
fn real_from_text_rejects_garbage() {
    for text in ["not_a_number", "", "   ", "123abc", "1e"] {
        assert!(matches!(
            Value::real_from_text(text),
            Err(RefJsonError::InvalidArgument(_))
        ));
    }
}

#[test]
fn real_from_text_rejects_overflow() {
    for text in ["1e1000", "-1e1000"] {
        assert!(matches!(
            Value::real_from_text(text),
            Err(RefJsonError::InvalidArgument(_))
        ));
    }
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn strings_escape_on_output() {
    assert_eq!(
        Value::string("Hello, world!").render().unwrap(),
        "\"Hello, world!\""
    );
    assert_eq!(
        Value::string("Line 1\nLine 2\tTabbed\rCarriage\u{8}Backspace\u{c}FormFeed")
            .render()
            .unwrap(),
        "\"Line 1\\nLine 2\\tTabbed\\rCarriage\\bBackspace\\fFormFeed\""
    );
    assert_eq!(
        Value::string("Special !@#$%^&*()_+-=[]{};:'\"\\|,<.>/?`~")
            .render()
            .unwrap(),
        "\"Special !@#$%^&*()_+-=[]{};:'\\\"\\\\|,<.>/?`~\""
    );
    assert_eq!(
        Value::string("Non-ASCII: üñîçødé, 中文, العربية")
            .render()
            .unwrap(),
        "\"Non-ASCII: üñîçødé, 中文, العربية\""
    );
    assert_eq!(Value::string("").render().unwrap(), "\"\"");
    assert_eq!(Value::string("key").as_str(), Some("key"));
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn empty_array_renders_inline() {
    let value = Value::array(vec![]);
    assert_eq!(value.render().unwrap(), "[]");
    assert_eq!(value.render_pretty().unwrap(), "[]");
    assert!(value.as_array().unwrap().is_empty());
}

#[test]
fn flat_array_renders_inline() {
    let value = sample_array();
    let array = value.as_array().unwrap();
    let options = EvalOptions::new();
    assert_eq!(array.len(), 4);
    assert_eq!(array.at(0, &options).unwrap().render().unwrap(), "1");
    assert_eq!(array.at(1, &options).unwrap().render().unwrap(), "1.0");
    assert_eq!(array.at(2, &options).unwrap().render().unwrap(), "true");
    assert_eq!(array.at(3, &options).unwrap().render().unwrap(), "\"test\"");
    assert_eq!(value.render().unwrap(), "[1, 1.0, true, \"test\"]");
    // Scalars are compact and empty, so pretty printing stays inline.
    assert_eq!(
        value.render_indented(1, true).unwrap(),
        "[1, 1.0, true, \"test\"]"
    );
}

#[test]
fn nested_array_breaks_lines_when_pretty() {
    let value = Value::array(vec![sample_array(), Value::Int(42)]);
    assert_eq!(
        value.render().unwrap(),
        "[[1, 1.0, true, \"test\"], 42]"
    );
    assert_eq!(
        value.render_indented(1, true).unwrap(),
        "[\n\t\t[1, 1.0, true, \"test\"],\n\t\t42\n\t]"
    );
}

#[test]
fn array_negative_indexing_toggle() {
    let value = sample_array();
    let array = value.as_array().unwrap();
    let negative = EvalOptions::new().with_negative_indexing();
    assert_eq!(array.at(-1, &negative).unwrap().render().unwrap(), "\"test\"");
    assert_eq!(array.at(-2, &negative).unwrap().render().unwrap(), "true");
    assert_eq!(array.at(-3, &negative).unwrap().render().unwrap(), "1.0");
    assert_eq!(array.at(-4, &negative).unwrap().render().unwrap(), "1");
    assert!(matches!(
        array.at(-5, &negative),
        Err(RefJsonError::IndexOutOfRange { index: -5, len: 4 })
    ));

    let plain = EvalOptions::new();
    assert!(matches!(
        array.at(-1, &plain),
        Err(RefJsonError::IndexOutOfRange { index: -1, len: 4 })
    ));
    assert!(matches!(
        array.at(4, &plain),
        Err(RefJsonError::IndexOutOfRange { index: 4, len: 4 })
    ));

    // The mirrored index matches counting from the end by hand.
    let last = array.at(array.len() as i32 - 1, &plain).unwrap();
    assert_eq!(last, array.at(-1, &negative).unwrap());
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn empty_object_renders_inline() {
    let value = Value::object(vec![]).unwrap();
    assert_eq!(value.render().unwrap(), "{}");
    assert_eq!(value.render_pretty().unwrap(), "{}");
}

#[test]
fn object_lookup_and_render() {
    let value = sample_object();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert_eq!(object.at("integer").unwrap().render().unwrap(), "42");
    assert_eq!(object.at("boolean").unwrap().render().unwrap(), "true");
    assert_eq!(
        object.at("string").unwrap().render().unwrap(),
        "\"Hello World\""
    );
    assert_eq!(
        value.render().unwrap(),
        "{\"integer\": 42, \"boolean\": true, \"string\": \"Hello World\"}"
    );
    assert_eq!(
        value.render_indented(1, true).unwrap(),
        "{\n\t\t\"integer\": 42,\n\t\t\"boolean\": true,\n\t\t\"string\": \"Hello World\"\n\t}"
    );

    let keys: Vec<String> = object.keys().iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["integer", "boolean", "string"]);

    assert!(matches!(
        object.at("nonexistent"),
        Err(RefJsonError::KeyNotFound { .. })
    ));
    assert!(object.get("nonexistent").is_none());
}

#[test]
fn duplicate_keys_rejected_at_construction() {
    let result = Value::object(vec![
        ("key1".to_string(), Value::Int(1)),
        ("key1".to_string(), Value::Int(2)),
    ]);
    assert!(matches!(
        result,
        Err(RefJsonError::DuplicateKey { key }) if key == "key1"
    ));
}

#[test]
fn single_scalar_object_stays_inline_when_pretty() {
    let number = Value::object(vec![("number".to_string(), Value::Int(10))]).unwrap();
    assert_eq!(number.render_pretty().unwrap(), "{\"number\": 10}");

    let text = Value::object(vec![("text".to_string(), Value::string("Sample Text"))]).unwrap();
    assert_eq!(text.render_pretty().unwrap(), "{\"text\": \"Sample Text\"}");

    let null = Value::object(vec![("nullValue".to_string(), Value::Null)]).unwrap();
    assert_eq!(null.render_pretty().unwrap(), "{\"nullValue\": null}");
}

#[test]
fn object_with_nonempty_child_breaks_lines_when_pretty() {
    let array = Value::object(vec![(
        "array".to_string(),
        Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
    )])
    .unwrap();
    assert_eq!(
        array.render_pretty().unwrap(),
        "{\n\t\"array\": [1, 2, 3]\n}"
    );

    let nested = Value::object(vec![(
        "nested".to_string(),
        Value::object(vec![("key".to_string(), Value::string("value"))]).unwrap(),
    )])
    .unwrap();
    assert_eq!(
        nested.render_pretty().unwrap(),
        "{\n\t\"nested\": {\"key\": \"value\"}\n}"
    );
}

#[test]
fn nested_object_renders_both_ways() {
    let value = Value::object(vec![
        ("nested_object".to_string(), sample_object()),
        (
            "array".to_string(),
            Value::array(vec![Value::Int(1), Value::string("Item")]),
        ),
    ])
    .unwrap();
    assert_eq!(
        value.render().unwrap(),
        "{\"nested_object\": {\"integer\": 42, \"boolean\": true, \"string\": \"Hello World\"}, \
         \"array\": [1, \"Item\"]}"
    );
    assert_eq!(
        value.render_indented(1, true).unwrap(),
        "{\n\t\t\"nested_object\": {\n\t\t\t\"integer\": 42,\n\t\t\t\"boolean\": true,\
         \n\t\t\t\"string\": \"Hello World\"\n\t\t},\n\t\t\"array\": [1, \"Item\"]\n\t}"
    );
}

// ============================================================================
// Dynamic lookup (`by`) and the symmetric toggle
// ============================================================================

#[test]
fn by_accepts_only_matching_pairings() {
    let array = Value::array(vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
    let object = Value::object(vec![
        ("key".to_string(), Value::Int(42)),
        ("flag".to_string(), Value::Bool(true)),
    ])
    .unwrap();
    let values = vec![
        Value::Null,
        Value::Bool(true),
        Value::Int(2),
        Value::real(2.0),
        Value::string("key"),
        array.clone(),
        object.clone(),
    ];
    let options = EvalOptions::new();

    for target in &values {
        for accessor in &values {
            let is_array_by_int = target.kind() == Kind::Array && accessor.kind() == Kind::Integer;
            let is_object_by_str = target.kind() == Kind::Object && accessor.kind() == Kind::String;
            if is_array_by_int {
                assert_eq!(target.by(accessor, &options).unwrap().render().unwrap(), "30");
            } else if is_object_by_str {
                assert_eq!(target.by(accessor, &options).unwrap().render().unwrap(), "42");
            } else {
                assert!(matches!(
                    target.by(accessor, &options),
                    Err(RefJsonError::Domain { .. })
                ));
            }
        }
    }

    assert!(matches!(
        array.by(&Value::Int(5), &options),
        Err(RefJsonError::IndexOutOfRange { index: 5, len: 3 })
    ));
    assert!(matches!(
        object.by(&Value::string("invalid_key"), &options),
        Err(RefJsonError::KeyNotFound { .. })
    ));
}

#[test]
fn symmetric_indexing_toggle() {
    let array = Value::array(vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
    let object = Value::object(vec![("key".to_string(), Value::Int(42))]).unwrap();
    let symmetric = EvalOptions::new().with_symmetric_indexing();

    assert_eq!(
        Value::Int(2).by(&array, &symmetric).unwrap().render().unwrap(),
        "30"
    );
    assert_eq!(
        Value::string("key")
            .by(&object, &symmetric)
            .unwrap()
            .render()
            .unwrap(),
        "42"
    );
    // Still mismatched even with the toggle on.
    assert!(matches!(
        Value::Bool(true).by(&Value::Int(1), &symmetric),
        Err(RefJsonError::Domain { .. })
    ));

    // And both pairings are domain errors with the toggle off.
    let plain = EvalOptions::new();
    assert!(matches!(
        Value::Int(2).by(&array, &plain),
        Err(RefJsonError::Domain {
            target: "JSON-Integer",
            accessor: "JSON-Array"
        })
    ));
    assert!(matches!(
        Value::string("key").by(&object, &plain),
        Err(RefJsonError::Domain {
            target: "JSON-String",
            accessor: "JSON-Object"
        })
    ));
}

// ============================================================================
// Equality
// ============================================================================

#[test]
fn structural_equality() {
    let a = Value::object(vec![
        ("a".to_string(), Value::Int(1)),
        ("b".to_string(), Value::array(vec![Value::string("x")])),
    ])
    .unwrap();
    let b = Value::object(vec![
        ("a".to_string(), Value::Int(1)),
        ("b".to_string(), Value::array(vec![Value::string("x")])),
    ])
    .unwrap();
    assert_eq!(a, b);

    let c = Value::object(vec![("a".to_string(), Value::Int(2))]).unwrap();
    assert_ne!(a, c);

    // Reals compare by their preserved text.
    assert_eq!(
        Value::real_from_text("1.50").unwrap(),
        Value::real_from_text("1.50").unwrap()
    );
    assert_ne!(
        Value::real_from_text("1.5").unwrap(),
        Value::real_from_text("1.50").unwrap()
    );
}
