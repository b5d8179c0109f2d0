// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Command-line driver tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const PROGRAM: &str = r#"{
  "body": [
    {"type": "PrintStatement", "argument": {"type": "StringLiteral", "value": "hello"}},
    {"type": "ExpressionStatement", "expression": {
      "type": "BinaryExpression", "operator": "*",
      "left": {"type": "NumericLiteral", "value": 6},
      "right": {"type": "NumericLiteral", "value": 7}
    }}
  ]
}"#;

const THROWS: &str = r#"{
  "body": [
    {"type": "ThrowStatement", "argument": {"type": "StringLiteral", "value": "boom"}}
  ]
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn cinder(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cinder"))
        .args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn test_run_prints_output_and_result() {
    let dir = TempDir::new().unwrap();
    write(&dir, "main.json", PROGRAM);

    let output = cinder(&dir, &["main.json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello"));
    assert!(stdout.contains("42"));
}

#[test]
fn test_uncaught_throw_fails() {
    let dir = TempDir::new().unwrap();
    write(&dir, "throws.json", THROWS);

    let output = cinder(&dir, &["throws.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("boom"));
}

#[test]
fn test_emit_disasm_lists_units() {
    let dir = TempDir::new().unwrap();
    write(&dir, "main.json", PROGRAM);

    let output = cinder(&dir, &["--emit", "disasm", "main.json"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Program_0"));
    assert!(stdout.contains("HELPER        Multiply"));
}

#[test]
fn test_emit_json_from_project_config() {
    let dir = TempDir::new().unwrap();
    write(&dir, "main.json", PROGRAM);
    write(&dir, "cinder.toml", "emit = \"json\"\nstrict = true\n");

    let output = cinder(&dir, &["main.json"]);
    assert!(output.status.success());
    let artifact: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(artifact["units"][0]["name"], "Program_0");
    assert_eq!(artifact["units"][0]["strict"], true);
}

#[test]
fn test_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = cinder(&dir, &["nope.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.json"));
}
