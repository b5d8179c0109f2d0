// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Code generation from program trees to compiled units.
//!
//! [`CodeGenerator`] implements both visitor traits. Each handler appends to
//! the [`UnitContext`] it is given; bodies owned by control constructs are
//! handed to the [`BlockManager`], which compiles them into separate units
//! with a fresh context.
//!
//! - `statements`: statement handlers and the completion protocol
//! - `expressions`: expression handlers
//! - `hoist`: `var` and function declaration collection

mod expressions;
mod hoist;
mod statements;


pub use hoist::{HoistCollector, Hoisted};

use super::block_manager::{BlockManager, Body};
use super::bytecode::{FunctionId, FunctionInfo, Instruction, OperandIndex, Role};
use super::completion::LabelSet;
use super::emitter::Emitter;
use super::error::CompileError;
use super::helpers::Helper;
use crate::ast::*;
use crate::ir::Constant;
use crate::runtime::value::number_to_string;

/// Per-unit generation state.
#[derive(Debug)]
pub struct UnitContext {
    pub emitter: Emitter,
    /// Labels waiting to be attached to the next loop or switch
    pending_labels: Vec<String>,
}

impl UnitContext {
    pub fn new(emitter: Emitter) -> Self {
        Self {
            emitter,
            pending_labels: Vec::new(),
        }
    }

    pub fn into_emitter(self) -> Emitter {
        self.emitter
    }

    pub fn unit_name(&self) -> &str {
        self.emitter.unit_name()
    }

    /// Claims the pending labels for the loop or switch being generated.
    fn take_labels(&mut self) -> LabelSet {
        LabelSet::new(std::mem::take(&mut self.pending_labels))
    }

    fn unsupported(&self, construct: &str) -> CompileError {
        CompileError::unsupported(construct, self.unit_name())
    }
}

/// Where an assignment lands.
#[derive(Debug, Clone, Copy)]
enum Reference {
    /// A named binding; nothing on the stack
    Binding(OperandIndex),
    /// A property; object and key on the stack
    Property,
}

/// Visitor that emits instructions for a unit.
pub struct CodeGenerator<'b> {
    blocks: &'b mut BlockManager,
}

impl<'b> CodeGenerator<'b> {
    pub fn new(blocks: &'b mut BlockManager) -> Self {
        Self { blocks }
    }

    /// Generates the code for one unit body.
    pub fn generate(
        &mut self,
        cx: &mut UnitContext,
        body: Body<'_>,
        strict: bool,
    ) -> Result<(), CompileError> {
        match body {
            Body::Program(program) => {
                self.declaration_prologue(cx, &program.body, strict)?;
                self.statement_list(cx, &program.body, strict)
            }
            Body::Function(function) => {
                self.declaration_prologue(cx, &function.body.body, strict)?;
                self.statement_list(cx, &function.body.body, strict)
            }
            Body::Statement(statement) => statement.accept(self, cx, strict),
            Body::Block(block) => self.statement_list(cx, &block.body, strict),
            Body::Clause(clause) => clause.accept(self, cx, strict),
            Body::Catch(clause) => clause.accept(self, cx, strict),
        }
    }

    /// Binds hoisted function declarations, then hoisted `var` names.
    fn declaration_prologue(
        &mut self,
        cx: &mut UnitContext,
        body: &[Statement],
        strict: bool,
    ) -> Result<(), CompileError> {
        let mut hoisted = Hoisted::default();
        let mut collector = HoistCollector::new(cx.unit_name());
        for statement in body {
            statement.accept(&mut collector, &mut hoisted, strict)?;
        }

        for (name, function) in hoisted.functions {
            let id = self.compile_function(function, strict, false)?;
            cx.emitter.make_closure(id);
            let binding = cx.emitter.variable(name)?;
            cx.emitter.emit(Instruction::InitializeBinding(binding));
        }
        for name in hoisted.vars {
            let binding = cx.emitter.variable(name)?;
            cx.emitter.emit(Instruction::DeclareVariable(binding));
        }
        Ok(())
    }

    /// Compiles a function body into its own unit and records its metadata.
    fn compile_function(
        &mut self,
        function: &Function,
        strict: bool,
        self_binding: bool,
    ) -> Result<FunctionId, CompileError> {
        let strict = strict || function.strict;
        let unit = self
            .blocks
            .compile(Role::Function, Body::Function(function), strict)?;
        Ok(self.blocks.register_function(FunctionInfo {
            unit,
            name: function.id.as_ref().map(|id| id.name.clone()),
            params: function.params.iter().map(|p| p.name.clone()).collect(),
            strict,
            self_binding,
        }))
    }

    /// Runs a statement list, leaving one completion: the first abrupt
    /// completion, or NORMAL carrying the value of the last statement that
    /// produced one.
    ///
    /// ```text
    ///   NormalCompletion            ; acc
    ///   [stmt]                      ; acc c
    ///   JumpIfAbrupt -> abrupt
    ///   MergeCompletion             ; acc'
    ///   ...
    ///   Jump -> end
    /// abrupt:
    ///   Swap; Pop                   ; c
    /// end:
    /// ```
    fn statement_list(
        &mut self,
        cx: &mut UnitContext,
        body: &[Statement],
        strict: bool,
    ) -> Result<(), CompileError> {
        cx.emitter.normal_completion();
        if body.is_empty() {
            return Ok(());
        }
        let abrupt = cx.emitter.new_label();
        let end = cx.emitter.new_label();
        for statement in body {
            statement.accept(self, cx, strict)?;
            cx.emitter.jump_if_abrupt(abrupt);
            cx.emitter.merge_completion();
        }
        cx.emitter.jump(end);
        cx.emitter.place_label(abrupt)?;
        cx.emitter.swap();
        cx.emitter.pop();
        cx.emitter.place_label(end)?;
        Ok(())
    }

    /// Compiles a nested body into its own unit and invokes it.
    fn invoke_body(
        &mut self,
        cx: &mut UnitContext,
        role: Role,
        body: Body<'_>,
        strict: bool,
    ) -> Result<(), CompileError> {
        let unit = self.blocks.compile(role, body, strict)?;
        cx.emitter.invoke_unit(unit);
        Ok(())
    }

    fn expression(
        &mut self,
        cx: &mut UnitContext,
        expression: &Expression,
        strict: bool,
    ) -> Result<(), CompileError> {
        expression.accept(self, cx, strict)
    }

    /// Evaluates an expression and converts it for a conditional jump.
    fn condition(
        &mut self,
        cx: &mut UnitContext,
        test: &Expression,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.expression(cx, test, strict)?;
        cx.emitter.call_helper(Helper::ToBoolean, 1)
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Evaluates the parts of an assignment target that precede the value.
    fn reference(
        &mut self,
        cx: &mut UnitContext,
        target: &Expression,
        strict: bool,
    ) -> Result<Reference, CompileError> {
        match target {
            Expression::Identifier(id) => Ok(Reference::Binding(cx.emitter.variable(&id.name)?)),
            Expression::Member(member) => {
                self.expression(cx, &member.object, strict)?;
                self.property_key(cx, member, strict)?;
                Ok(Reference::Property)
            }
            _ => Err(cx.unsupported("invalid assignment target")),
        }
    }

    /// Reads through a reference, keeping it usable for a following write.
    fn get_reference(&mut self, cx: &mut UnitContext, reference: Reference) -> Result<(), CompileError> {
        match reference {
            Reference::Binding(binding) => {
                cx.emitter.emit(Instruction::Load(binding));
                Ok(())
            }
            Reference::Property => {
                cx.emitter.dup2();
                cx.emitter.call_helper(Helper::GetProperty, 2)
            }
        }
    }

    /// Writes the top value through a reference, leaving the value.
    fn put_reference(
        &mut self,
        cx: &mut UnitContext,
        reference: Reference,
        strict: bool,
    ) -> Result<(), CompileError> {
        match reference {
            Reference::Binding(variable) => {
                cx.emitter.emit(Instruction::Store { variable, strict });
                Ok(())
            }
            Reference::Property => cx.emitter.call_helper(Helper::PutProperty { strict }, 3),
        }
    }

    /// Pushes the key of a member expression.
    fn property_key(
        &mut self,
        cx: &mut UnitContext,
        member: &MemberExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        if member.computed {
            return self.expression(cx, &member.property, strict);
        }
        match member.property.as_ref() {
            Expression::Identifier(id) => cx
                .emitter
                .load_constant(Constant::String(id.name.clone())),
            _ => Err(cx.unsupported("non-identifier property name")),
        }
    }

    /// The property name an object literal key denotes.
    fn literal_key(&self, cx: &UnitContext, key: &Expression) -> Result<String, CompileError> {
        match key {
            Expression::Identifier(id) => Ok(id.name.clone()),
            Expression::String { value } => Ok(value.clone()),
            Expression::Number { value } => Ok(number_to_string(*value)),
            _ => Err(cx.unsupported("computed key in object literal")),
        }
    }
}
