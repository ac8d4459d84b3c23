//! Error types for parsing, lookup, and reference evaluation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the parser, the lookup primitives, and the
/// reference engine.
///
/// Each variant corresponds to one failure category: `Parse` for any
/// scanner/parser failure (with the 1-based position where the scanner
/// stood), `Domain` for incompatible `by` operands, `IndexOutOfRange`
/// and `KeyNotFound` for failed lookups, `DuplicateKey` and `Looped`
/// for structural problems, and `InvalidArgument` for everything the
/// engine rejects outright (recursive functions, bad folds, malformed
/// real literals).
#[derive(Error, Debug)]
pub enum RefJsonError {
    /// The input text could not be parsed.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        /// 1-based line of the offending character.
        line: usize,
        /// 1-based column of the offending character.
        column: usize,
        /// What the parser expected or found.
        message: String,
    },

    /// A value was indexed by an accessor of an incompatible type,
    /// e.g. an object by an integer with symmetric indexing off.
    #[error("cannot evaluate {target} by {accessor}")]
    Domain {
        /// Type name of the value being indexed.
        target: &'static str,
        /// Type name of the accessor.
        accessor: &'static str,
    },

    /// An array index fell outside the array, after negative-index
    /// resolution if that is enabled.
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange {
        /// The index as written.
        index: i32,
        /// Length of the array at lookup time.
        len: usize,
    },

    /// An object lookup named a key that is not present.
    #[error("key `{key}` not found")]
    KeyNotFound {
        /// The missing key.
        key: String,
    },

    /// An object was constructed with the same key twice.
    #[error("duplicate key `{key}`")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// A cyclic value reached the formatter.
    #[error("value is looped")]
    Looped,

    /// The engine was asked to do something structurally invalid:
    /// a recursive function argument, a `min`/`max` fold over nothing
    /// or over non-integers, or a malformed real literal.
    #[error("{0}")]
    InvalidArgument(String),

    /// An input file could not be opened or read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias used throughout refjson-core.
pub type Result<T> = std::result::Result<T, RefJsonError>;
