//! Integration tests for the `refjson` binary.
//!
//! These use `assert_cmd` and `predicates` to run the actual binary
//! against a fixture document: evaluation, pretty output, the indexing
//! flags, and error reporting.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the sample.json fixture.
fn sample_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.json")
}

fn refjson() -> Command {
    Command::cargo_bin("refjson").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn picks_a_string_field() {
    refjson()
        .args([sample_json_path(), "$.name"])
        .assert()
        .success()
        .stdout("\"Alice\"\n");
}

#[test]
fn bare_identifiers_work_as_root_sugar() {
    refjson()
        .args([sample_json_path(), "contact.email"])
        .assert()
        .success()
        .stdout("\"alice@example.com\"\n");
}

#[test]
fn indexes_into_arrays() {
    refjson()
        .args([sample_json_path(), "$.scores[1]"])
        .assert()
        .success()
        .stdout("87\n");
}

#[test]
fn whole_document_with_root_expression() {
    refjson()
        .args([sample_json_path(), "$"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Alice\""))
        .stdout(predicate::str::contains("\"scores\": [95, 87, 92]"));
}

#[test]
fn set_projection_produces_an_array() {
    refjson()
        .args([sample_json_path(), "${.name, .tags}"])
        .assert()
        .success()
        .stdout("[\"Alice\", [\"admin\", \"editor\"]]\n");
}

#[test]
fn size_builtin_counts_elements() {
    refjson()
        .args([sample_json_path(), "size($.scores)"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn max_builtin_folds_an_array() {
    refjson()
        .args([sample_json_path(), "max($.scores)"])
        .assert()
        .success()
        .stdout("95\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Flags
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn pretty_output_indents_with_tabs() {
    refjson()
        .args([sample_json_path(), "$.contact", "--pretty"])
        .assert()
        .success()
        .stdout("{\n\t\"email\": \"alice@example.com\",\n\t\"city\": \"Aachen\"\n}\n");
}

#[test]
fn negative_indexing_flag() {
    refjson()
        .args([sample_json_path(), "$.scores[-1]", "--negative-indexing"])
        .assert()
        .success()
        .stdout("92\n");

    // Without the flag the same index is out of range.
    refjson()
        .args([sample_json_path(), "$.scores[-1]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn symmetric_indexing_flag() {
    refjson()
        .args([sample_json_path(), "1[$.scores]", "--symmetric-indexing"])
        .assert()
        .success()
        .stdout("87\n");

    refjson()
        .args([sample_json_path(), "1[$.scores]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot evaluate"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn missing_file_reports_to_stderr() {
    refjson()
        .args(["no-such-file.json", "$.name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn missing_key_reports_to_stderr() {
    refjson()
        .args([sample_json_path(), "$.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key `nope` not found"));
}

#[test]
fn malformed_expression_reports_to_stderr() {
    refjson()
        .args([sample_json_path(), "$.["])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse error"));
}

#[test]
fn missing_arguments_fail() {
    refjson().assert().failure();
    refjson().arg(sample_json_path()).assert().failure();
}
