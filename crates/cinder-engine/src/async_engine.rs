// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Asynchronous engine APIs.
//!
//! Program-tree files are read with non-blocking I/O and evaluated one at a
//! time against a shared engine.
//!
//! # Example
//!
//! ```ignore
//! use cinder_engine::AsyncEngine;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = AsyncEngine::new();
//!     let completion = engine.eval_file("program.json").await.unwrap();
//!     println!("{:?}", completion);
//! }
//! ```

use tokio::fs;
use tokio::sync::Mutex;

use std::path::Path;
use std::sync::Arc;

use crate::ast::Program;
use crate::compiler::Completion;
use crate::config::Config;
use crate::runtime::Value;
use crate::{Engine, Result};

/// Reads a program tree from a JSON file.
pub async fn load_program(path: impl AsRef<Path>) -> Result<Program> {
    let json = fs::read_to_string(path.as_ref()).await?;
    Ok(serde_json::from_str(&json)?)
}

/// An asynchronous engine.
///
/// Wraps the synchronous [`Engine`]; evaluations are serialized through a
/// mutex, so every program sees the globals left by the previous one.
#[derive(Clone)]
pub struct AsyncEngine {
    engine: Arc<Mutex<Engine>>,
}

impl AsyncEngine {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            engine: Arc::new(Mutex::new(Engine::with_config(config))),
        }
    }

    /// Compiles and runs a program.
    pub async fn eval(&self, program: &Program) -> Result<Completion> {
        let mut engine = self.engine.lock().await;
        engine.eval(program)
    }

    /// Evaluates a program-tree file.
    pub async fn eval_file(&self, path: impl AsRef<Path>) -> Result<Completion> {
        let program = load_program(path).await?;
        self.eval(&program).await
    }

    /// Evaluates several files concurrently. Reads overlap; evaluation order
    /// follows lock acquisition. Results are in input order.
    pub async fn eval_files(&self, paths: &[impl AsRef<Path>]) -> Vec<Result<Completion>> {
        let futures: Vec<_> = paths.iter().map(|p| self.eval_file(p)).collect();
        futures::future::join_all(futures).await
    }

    /// Renders a value the way `print` would.
    pub async fn display(&self, value: &Value) -> String {
        self.engine.lock().await.display(value)
    }

    /// Drains the engine's printed output.
    pub async fn take_output(&self) -> Vec<String> {
        self.engine.lock().await.take_output()
    }
}

impl Default for AsyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles many programs at once on a thread pool.
///
/// Each program gets its own block manager and emitter; nothing is shared
/// between compilations.
#[cfg(feature = "parallel")]
pub struct ParallelCompiler {
    pool: rayon::ThreadPool,
    strict: bool,
}

#[cfg(feature = "parallel")]
impl ParallelCompiler {
    /// Creates a compiler with the default number of threads.
    pub fn new() -> Result<Self> {
        Ok(Self {
            pool: rayon::ThreadPoolBuilder::new().build()?,
            strict: false,
        })
    }

    pub fn with_threads(num_threads: usize) -> Result<Self> {
        Ok(Self {
            pool: rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()?,
            strict: false,
        })
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns one artifact per program, in input order.
    pub fn compile_all(
        &self,
        programs: &[Program],
    ) -> Vec<std::result::Result<crate::compiler::Artifact, crate::CompileError>> {
        use rayon::prelude::*;

        let compiler = crate::compiler::Compiler::new().strict(self.strict);
        self.pool.install(|| {
            programs
                .par_iter()
                .map(|program| compiler.compile(program))
                .collect()
        })
    }
}
