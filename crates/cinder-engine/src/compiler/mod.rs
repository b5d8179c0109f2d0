// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bytecode compiler.
//!
//! Transforms program trees into an [`Artifact`]: a set of named compiled
//! units plus a function table, executed by the VM.
//!
//! # Module Structure
//!
//! - `bytecode`: instructions, units and artifacts
//! - `block_manager`: compiles nested bodies into named units
//! - `codegen`: the visitor that emits code for each unit
//! - `completion`: completion records and label sets
//! - `disasm`: human readable listings
//! - `emitter`: per-unit instruction buffer with symbolic labels
//! - `helpers`: the runtime helper catalog

pub mod block_manager;
pub mod bytecode;
pub mod codegen;
pub mod completion;
pub mod disasm;
pub mod emitter;
pub mod error;
pub mod helpers;

pub use block_manager::{BlockManager, Body};
pub use bytecode::{
    Artifact, CompiledUnit, FunctionId, FunctionInfo, Instruction, Label, OperandIndex, Role,
    UnitId,
};
pub use completion::{Completion, CompletionKind, LabelSet};
pub use error::CompileError;
pub use helpers::Helper;

use crate::ast::Program;
use tracing::debug;

/// Compiles whole programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    strict: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every program as strict code, whatever its directives say.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Compiles a program into an artifact whose entry unit is `Program_0`.
    pub fn compile(&self, program: &Program) -> Result<Artifact, CompileError> {
        let strict = self.strict || program.strict;
        let mut blocks = BlockManager::new();
        let entry = blocks.compile(Role::Program, Body::Program(program), strict)?;
        let artifact = blocks.finish(entry)?;
        debug!(
            units = artifact.units.len(),
            functions = artifact.functions.len(),
            strict,
            "compiled program"
        );
        Ok(artifact)
    }
}

/// Compiles a program with default settings.
pub fn compile(program: &Program) -> Result<Artifact, CompileError> {
    Compiler::new().compile(program)
}
