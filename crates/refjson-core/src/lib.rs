//! # refjson-core
//!
//! A JSON value model and path-query evaluator with two extensions
//! beyond plain JSON: a small **path expression** sublanguage (dotted
//! keys, bracket indices, set projections, named functions) and **lazy
//! symbolic references** (`$` for the outermost document, `@` for the
//! enclosing container) that stay unresolved until enough context is
//! known, then simplify in place.
//!
//! ## Quick start
//!
//! ```rust
//! use refjson_core::{eval, parse, parse_expr, EvalOptions};
//!
//! // Path expressions evaluate while they parse once context is known:
//! let value = parse_expr(r#"{"life":42}.life"#).unwrap();
//! assert_eq!(value.render().unwrap(), "42");
//!
//! // `$` stays symbolic until a document is bound:
//! let residual = parse_expr(r#"[1,2,3,4][$.key]"#).unwrap();
//! assert_eq!(residual.render().unwrap(), r#"[1, 2, 3, 4][$["key"]]"#);
//!
//! // …which is what `eval` does:
//! let document = parse(r#"{"key": 2}"#).unwrap();
//! let picked = eval(&document, "[1,2,3,4][$.key]", EvalOptions::new()).unwrap();
//! assert_eq!(picked.render().unwrap(), "3");
//! ```
//!
//! ## Modules
//!
//! - [`value`] — the value algebra: seven JSON variants plus a
//!   reference variant, lookup, compactness, rendering, cycle guard
//! - [`reference`] — the reference engine: paths, sets, functions, and
//!   the `simplify` rewrite loop
//! - [`scanner`] — line-buffered character source with one-char
//!   lookahead and `//` comment skipping
//! - [`parser`] — recursive-descent parser, strict and dynamic modes
//! - [`options`] — evaluation options (indexing toggles)
//! - [`error`] — error types

pub mod error;
pub mod options;
pub mod parser;
pub mod reference;
pub mod scanner;
pub mod value;

pub use error::{RefJsonError, Result};
pub use options::EvalOptions;
pub use parser::Parser;
pub use reference::{RefKind, RefNode, SetKind};
pub use scanner::Scanner;
pub use value::{Kind, Value};

use std::path::Path;

/// Parse strict JSON from a string.
pub fn parse(input: &str) -> Result<Value> {
    Parser::new(Scanner::from_string(input)).parse_all(false)
}

/// Parse strict JSON from a string with explicit evaluation options.
pub fn parse_with_options(input: &str, options: EvalOptions) -> Result<Value> {
    Parser::with_options(Scanner::from_string(input), options).parse_all(false)
}

/// Parse a dynamic path expression from a string. References that can
/// already resolve (a concrete head, a bound `@`) collapse during
/// parsing; the rest stay symbolic.
pub fn parse_expr(input: &str) -> Result<Value> {
    Parser::new(Scanner::from_string(input)).parse_all(true)
}

/// Parse a dynamic path expression with explicit evaluation options.
pub fn parse_expr_with_options(input: &str, options: EvalOptions) -> Result<Value> {
    Parser::with_options(Scanner::from_string(input), options).parse_all(true)
}

/// Parse strict JSON from a byte buffer, which must be valid UTF-8.
pub fn parse_bytes(input: &[u8]) -> Result<Value> {
    Parser::new(Scanner::from_bytes(input)?).parse_all(false)
}

/// Parse strict JSON from a file, read line by line.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Value> {
    Parser::new(Scanner::from_path(path)?).parse_all(false)
}

/// Parse strict JSON from a file with explicit evaluation options.
pub fn parse_file_with_options(path: impl AsRef<Path>, options: EvalOptions) -> Result<Value> {
    Parser::with_options(Scanner::from_path(path)?, options).parse_all(false)
}

/// Evaluate a path expression against a document: parse the
/// expression dynamically, bind `$` to the document, and return the
/// reduced value.
pub fn eval(document: &Value, expression: &str, options: EvalOptions) -> Result<Value> {
    let value = parse_expr_with_options(expression, options)?;
    value.set_root(document, &options)?;
    let result = match &value {
        Value::Ref(reference) => reference.value()?,
        other => other.clone(),
    };
    // Binding the root may have produced new cycles; flag them before
    // the caller renders.
    result.touch();
    Ok(result)
}
