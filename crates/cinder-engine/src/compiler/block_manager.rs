// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Compilation of nested bodies into named units.
//!
//! Every body a control construct owns (a then-branch, a loop body, a case
//! clause, a catch block, a function body) becomes its own
//! [`CompiledUnit`]. The owning construct's code invokes it by id and reacts
//! to the completion it returns. The manager owns the registry for one
//! compilation, so units from different programs never share names.

use super::bytecode::{Artifact, CompiledUnit, FunctionId, FunctionInfo, Role, UnitId};
use super::codegen::{CodeGenerator, UnitContext};
use super::emitter::Emitter;
use super::error::CompileError;
use crate::ast::{BlockStatement, CatchClause, Function, Program, Statement, SwitchCase};
use rustc_hash::FxHashMap;
use tracing::debug;

/// A syntactic body that can be compiled into a unit.
#[derive(Debug, Clone, Copy)]
pub enum Body<'ast> {
    Program(&'ast Program),
    Function(&'ast Function),
    Statement(&'ast Statement),
    Block(&'ast BlockStatement),
    Clause(&'ast SwitchCase),
    Catch(&'ast CatchClause),
}

#[derive(Debug)]
enum Slot {
    /// Id handed out, body still being generated
    Reserved(String),
    Ready(CompiledUnit),
}

/// Registry of the units produced by one compilation.
#[derive(Debug, Default)]
pub struct BlockManager {
    slots: Vec<Slot>,
    names: FxHashMap<String, UnitId>,
    counters: FxHashMap<Role, u32>,
    functions: Vec<FunctionInfo>,
}

impl BlockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `body` into a new unit named after `role` and returns its id.
    ///
    /// The id and name are reserved before the body is generated, so a unit
    /// is numbered ahead of the units nested inside it. The body is finished
    /// before this returns.
    pub fn compile(
        &mut self,
        role: Role,
        body: Body<'_>,
        strict: bool,
    ) -> Result<UnitId, CompileError> {
        let (id, name) = self.reserve(role)?;
        let mut cx = UnitContext::new(Emitter::new(name.clone()));
        CodeGenerator::new(self).generate(&mut cx, body, strict)?;
        let unit = cx.into_emitter().finish(role, strict)?;
        debug!(
            unit = %name,
            instructions = unit.instructions.len(),
            operands = unit.operands.len(),
            temps = unit.temp_count,
            "compiled unit"
        );
        self.slots[id.index()] = Slot::Ready(unit);
        Ok(id)
    }

    fn reserve(&mut self, role: Role) -> Result<(UnitId, String), CompileError> {
        let counter = self.counters.entry(role).or_insert(0);
        let name = format!("{}_{}", role.tag(), counter);
        *counter += 1;
        if self.names.contains_key(&name) {
            return Err(CompileError::DuplicateUnitName(name));
        }
        let id = UnitId(self.slots.len() as u32);
        self.slots.push(Slot::Reserved(name.clone()));
        self.names.insert(name.clone(), id);
        Ok((id, name))
    }

    /// Adds a function to the artifact's function table.
    pub fn register_function(&mut self, info: FunctionInfo) -> FunctionId {
        self.functions.push(info);
        FunctionId((self.functions.len() - 1) as u32)
    }

    /// A finished unit.
    pub fn unit(&self, id: UnitId) -> Option<&CompiledUnit> {
        match self.slots.get(id.index()) {
            Some(Slot::Ready(unit)) => Some(unit),
            _ => None,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<UnitId> {
        self.names.get(name).copied()
    }

    pub fn unit_count(&self) -> usize {
        self.slots.len()
    }

    /// Packages every unit into an artifact whose entry point is `entry`.
    pub fn finish(self, entry: UnitId) -> Result<Artifact, CompileError> {
        let units = self
            .slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Ready(unit) => Ok(unit),
                Slot::Reserved(name) => Err(CompileError::UnfinishedUnit(name)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Artifact {
            entry,
            units,
            functions: self.functions,
        })
    }
}
