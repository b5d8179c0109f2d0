// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # cinder-engine
//!
//! A bytecode-emitting compiler backend for an ECMAScript-style scripting
//! language, with a small reference runtime that executes what it emits.
//!
//! ## Overview
//!
//! This crate provides:
//! - A program tree (ESTree-shaped, deserialized from JSON) with a
//!   double-dispatch visitor
//! - A compiler that splits every nested body into a named compiled unit
//! - Completion records for structured control flow across units
//! - A reference interpreter, runtime helpers and a disassembler
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cinder_engine::{Engine, Value};
//!
//! let mut engine = Engine::new();
//! let completion = engine.eval_json(r#"{"body": [{"type": "ExpressionStatement",
//!     "expression": {"type": "NumericLiteral", "value": 3}}]}"#)?;
//! assert_eq!(completion.value, Some(Value::Number(3.0)));
//! ```

#![warn(clippy::all)]

pub mod ast;
pub mod compiler;
pub mod config;
pub mod ir;
pub mod runtime;
pub mod vm;

#[cfg(feature = "async")]
pub mod async_engine;

pub use ast::Program;
pub use compiler::{Artifact, CompileError, Completion, CompletionKind, Compiler};
pub use config::{Config, EmitMode};
pub use runtime::{Realm, Value};
pub use vm::VmError;

#[cfg(feature = "async")]
pub use async_engine::AsyncEngine;
#[cfg(all(feature = "async", feature = "parallel"))]
pub use async_engine::ParallelCompiler;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors surfaced by the engine facade.
#[derive(Debug, Error)]
pub enum Error {
    /// The program could not be compiled
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// Compiled code broke a VM invariant
    #[error("internal error: {0}")]
    Vm(#[from] VmError),

    /// The program tree JSON is malformed
    #[error("invalid program tree: {0}")]
    ProgramTree(#[from] serde_json::Error),

    /// A configuration source is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool could not be started
    #[cfg(feature = "parallel")]
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main engine instance.
///
/// Owns a realm, so global bindings persist across evaluations.
#[derive(Debug)]
pub struct Engine {
    realm: Realm,
    config: Config,
}

impl Engine {
    /// Creates an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            realm: Realm::with_limits(config.max_call_depth, config.trace_units),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Compiles a program using the engine's strictness setting.
    pub fn compile(&self, program: &Program) -> Result<Arc<Artifact>> {
        let artifact = Compiler::new().strict(self.config.strict).compile(program)?;
        info!(units = artifact.units.len(), "program compiled");
        Ok(Arc::new(artifact))
    }

    /// Runs a compiled artifact against this engine's realm.
    ///
    /// An uncaught script error is returned as a THROW completion, not as
    /// an `Err`. Only NORMAL and THROW are valid program results: a RETURN,
    /// BREAK or CONTINUE escaping the entry unit is reported as
    /// [`VmError::EscapedCompletion`]. Use [`vm::run_program`] to observe the
    /// entry unit's raw completion.
    pub fn run(&mut self, artifact: &Arc<Artifact>) -> Result<Completion> {
        let strict = artifact.entry_unit().is_some_and(|unit| unit.strict);
        let completion = vm::run_program(artifact, &mut self.realm, strict)?;
        match completion.kind {
            CompletionKind::Normal | CompletionKind::Throw => {
                info!(kind = %completion.kind, "program finished");
                Ok(completion)
            }
            kind => Err(VmError::EscapedCompletion {
                kind,
                unit: artifact
                    .entry_unit()
                    .map(|unit| unit.name.clone())
                    .unwrap_or_default(),
            }
            .into()),
        }
    }

    /// Compiles and runs a program.
    pub fn eval(&mut self, program: &Program) -> Result<Completion> {
        let artifact = self.compile(program)?;
        self.run(&artifact)
    }

    /// Evaluates a program tree given as JSON.
    pub fn eval_json(&mut self, json: &str) -> Result<Completion> {
        let program: Program = serde_json::from_str(json)?;
        self.eval(&program)
    }

    /// Evaluates a program tree read from a JSON file.
    pub fn eval_file(&mut self, path: impl AsRef<Path>) -> Result<Completion> {
        let json = std::fs::read_to_string(path)?;
        self.eval_json(&json)
    }

    /// Renders a value the way `print` would.
    pub fn display(&self, value: &Value) -> String {
        self.realm.to_js_string(value)
    }

    /// Drains the lines printed so far.
    pub fn take_output(&mut self) -> Vec<String> {
        self.realm.take_output()
    }

    /// How many times the named unit ran. Requires `trace_units`.
    pub fn unit_invocations(&self, unit: &str) -> usize {
        self.realm.unit_invocations(unit)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_program_completes_normally() {
        let mut engine = Engine::new();
        let completion = engine.eval_json(r#"{"body": []}"#).unwrap();
        assert_eq!(completion, Completion::normal());
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let mut engine = Engine::new();
        let err = engine.eval_json("{").unwrap_err();
        assert!(matches!(err, Error::ProgramTree(_)));
    }

    #[test]
    fn test_globals_persist_across_evaluations() {
        let mut engine = Engine::new();
        engine
            .eval_json(
                r#"{"body": [{"type": "VariableDeclaration", "kind": "var", "declarations": [
                    {"type": "VariableDeclarator", "id": {"type": "Identifier", "name": "x"},
                     "init": {"type": "NumericLiteral", "value": 4}}]}]}"#,
            )
            .unwrap();
        let completion = engine
            .eval_json(
                r#"{"body": [{"type": "ExpressionStatement",
                    "expression": {"type": "Identifier", "name": "x"}}]}"#,
            )
            .unwrap();
        assert_eq!(completion.value, Some(Value::Number(4.0)));
    }

    #[test]
    fn test_compile_error_surfaces() {
        let mut engine = Engine::new();
        let err = engine
            .eval_json(
                r#"{"body": [{"type": "WithStatement",
                    "object": {"type": "Identifier", "name": "o"},
                    "body": {"type": "EmptyStatement"}}]}"#,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
    }
}
