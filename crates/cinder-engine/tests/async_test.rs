// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tests for the async engine and the parallel compiler.

#![cfg(all(feature = "async", feature = "parallel"))]

use cinder_engine::async_engine::load_program;
use cinder_engine::{AsyncEngine, CompletionKind, Error, ParallelCompiler, Program, Value};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_program(dir: &TempDir, name: &str, body: serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, json!({ "body": body }).to_string()).unwrap();
    path
}

fn declare(name: &str, value: f64) -> serde_json::Value {
    json!({
        "type": "VariableDeclaration",
        "declarations": [{
            "id": {"type": "Identifier", "name": name},
            "init": {"type": "NumericLiteral", "value": value},
        }],
    })
}

fn read(name: &str) -> serde_json::Value {
    json!({"type": "ExpressionStatement", "expression": {"type": "Identifier", "name": name}})
}

#[tokio::test]
async fn test_eval_file() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "main.json", json!([declare("x", 2.0), read("x")]));

    let engine = AsyncEngine::new();
    let completion = engine.eval_file(&path).await.unwrap();
    assert_eq!(completion.value, Some(Value::Number(2.0)));
}

#[tokio::test]
async fn test_files_share_globals() {
    let dir = TempDir::new().unwrap();
    let first = write_program(&dir, "first.json", json!([declare("shared", 9.0)]));
    let second = write_program(&dir, "second.json", json!([read("shared")]));

    let engine = AsyncEngine::new();
    engine.eval_file(&first).await.unwrap();
    let completion = engine.eval_file(&second).await.unwrap();
    assert_eq!(completion.value, Some(Value::Number(9.0)));
}

#[tokio::test]
async fn test_eval_files_reports_each_result() {
    let dir = TempDir::new().unwrap();
    let good = write_program(&dir, "good.json", json!([read("undefined")]));
    let missing = dir.path().join("missing.json");

    let engine = AsyncEngine::new();
    let results = engine.eval_files(&[good, missing]).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().kind, CompletionKind::Normal);
    assert!(matches!(results[1], Err(Error::Io(_))));
}

#[tokio::test]
async fn test_load_program_rejects_malformed_trees() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"body": [{"type": "GotoStatement"}]}"#).unwrap();

    let err = load_program(&path).await.unwrap_err();
    assert!(matches!(err, Error::ProgramTree(_)));
}

#[tokio::test]
async fn test_output_is_drained() {
    let dir = TempDir::new().unwrap();
    let path = write_program(
        &dir,
        "print.json",
        json!([{"type": "PrintStatement", "argument": {"type": "StringLiteral", "value": "hi"}}]),
    );

    let engine = AsyncEngine::new();
    engine.eval_file(&path).await.unwrap();
    assert_eq!(engine.take_output().await, vec!["hi".to_string()]);
    assert!(engine.take_output().await.is_empty());
}

#[test]
fn test_parallel_compile_keeps_input_order() {
    let programs: Vec<Program> = (0..8)
        .map(|i| {
            serde_json::from_value(json!({ "body": [declare(&format!("v{i}"), i as f64)] }))
                .unwrap()
        })
        .collect();

    let compiler = ParallelCompiler::with_threads(4).unwrap();
    let artifacts = compiler.compile_all(&programs);
    assert_eq!(artifacts.len(), 8);
    for (i, artifact) in artifacts.into_iter().enumerate() {
        let artifact = artifact.unwrap();
        let entry = artifact.entry_unit().unwrap();
        // Every compilation numbers its units from zero.
        assert_eq!(entry.name, "Program_0");
        assert!(
            entry
                .used_variables()
                .iter()
                .any(|variable| variable.name == format!("v{i}"))
        );
    }
}
