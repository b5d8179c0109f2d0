// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Instruction emission for a single unit.
//!
//! Labels are symbolic while a unit is being built: jumps may reference a
//! label before it is placed. [`Emitter::finish`] resolves every label to an
//! offset and rejects units with dangling or doubly placed labels.

use super::bytecode::{
    CompiledUnit, FunctionId, Instruction, Label, OperandIndex, Role, UnitId,
};
use super::completion::{CompletionKind, LabelSet};
use super::error::CompileError;
use super::helpers::Helper;
use crate::ir::{Constant, Operand, OperandKey, Temporary};
use rustc_hash::FxHashMap;

/// Builds the instruction stream of one compiled unit.
#[derive(Debug)]
pub struct Emitter {
    unit: String,
    instructions: Vec<Instruction>,
    operands: Vec<Operand>,
    interned: FxHashMap<OperandKey, OperandIndex>,
    labels: Vec<Option<usize>>,
    temp_count: u16,
}

impl Emitter {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            instructions: Vec::new(),
            operands: Vec::new(),
            interned: FxHashMap::default(),
            labels: Vec::new(),
            temp_count: 0,
        }
    }

    /// Name of the unit under construction.
    pub fn unit_name(&self) -> &str {
        &self.unit
    }

    /// Appends an instruction and returns its offset.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let offset = self.instructions.len();
        self.instructions.push(instruction);
        offset
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Creates a fresh, unplaced label.
    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label((self.labels.len() - 1) as u32)
    }

    /// Places `label` at the next instruction offset.
    pub fn place_label(&mut self, label: Label) -> Result<(), CompileError> {
        let offset = self.instructions.len();
        match self.labels.get_mut(label.index()) {
            Some(slot @ None) => {
                *slot = Some(offset);
                Ok(())
            }
            _ => Err(CompileError::DuplicateLabel {
                label: label.0,
                unit: self.unit.clone(),
            }),
        }
    }

    pub fn jump(&mut self, label: Label) {
        self.emit(Instruction::Jump(label));
    }

    pub fn jump_if_false(&mut self, label: Label) {
        self.emit(Instruction::JumpIfFalse(label));
    }

    pub fn jump_if_true(&mut self, label: Label) {
        self.emit(Instruction::JumpIfTrue(label));
    }

    // ========================================================================
    // Operands
    // ========================================================================

    /// Interns an operand in the unit's operand table.
    pub fn operand(&mut self, operand: Operand) -> Result<OperandIndex, CompileError> {
        let key = operand.key();
        if let Some(index) = self.interned.get(&key) {
            return Ok(*index);
        }
        if self.operands.len() > u16::MAX as usize {
            return Err(CompileError::TooManyOperands {
                what: "operands",
                unit: self.unit.clone(),
            });
        }
        let index = OperandIndex(self.operands.len() as u16);
        self.operands.push(operand);
        self.interned.insert(key, index);
        Ok(index)
    }

    /// Interns a variable operand.
    pub fn variable(&mut self, name: &str) -> Result<OperandIndex, CompileError> {
        self.operand(Operand::variable(name))
    }

    /// Pushes an operand's value.
    pub fn load(&mut self, operand: Operand) -> Result<(), CompileError> {
        let index = self.operand(operand)?;
        self.emit(Instruction::Load(index));
        Ok(())
    }

    pub fn load_constant(&mut self, constant: Constant) -> Result<(), CompileError> {
        self.load(Operand::Constant(constant))
    }

    /// Reserves `count` consecutive temporaries and returns the first.
    pub fn allocate_temps(&mut self, count: u16) -> Result<Temporary, CompileError> {
        let first = self.temp_count;
        self.temp_count = self
            .temp_count
            .checked_add(count)
            .ok_or_else(|| CompileError::TooManyOperands {
                what: "temporaries",
                unit: self.unit.clone(),
            })?;
        Ok(Temporary::new(first))
    }

    pub fn allocate_temp(&mut self) -> Result<Temporary, CompileError> {
        self.allocate_temps(1)
    }

    pub fn load_temp(&mut self, temp: Temporary) -> Result<(), CompileError> {
        self.load(Operand::Temporary(temp))
    }

    pub fn store_temp(&mut self, temp: Temporary) {
        self.emit(Instruction::StoreTemp(temp));
    }

    // ========================================================================
    // Stack
    // ========================================================================

    pub fn pop(&mut self) {
        self.emit(Instruction::Pop);
    }

    pub fn dup(&mut self) {
        self.emit(Instruction::Dup);
    }

    pub fn dup2(&mut self) {
        self.emit(Instruction::Dup2);
    }

    pub fn swap(&mut self) {
        self.emit(Instruction::Swap);
    }

    pub fn nop(&mut self) {
        self.emit(Instruction::Nop);
    }

    // ========================================================================
    // Units, helpers and closures
    // ========================================================================

    pub fn invoke_unit(&mut self, unit: UnitId) {
        self.emit(Instruction::InvokeUnit(unit));
    }

    /// Emits a helper call after checking `supplied` against the helper's
    /// catalog arity.
    pub fn call_helper(&mut self, helper: Helper, supplied: usize) -> Result<(), CompileError> {
        let expected = helper.arity();
        if expected != supplied {
            return Err(CompileError::HelperArityMismatch {
                helper: helper.name(),
                expected,
                supplied,
                unit: self.unit.clone(),
            });
        }
        self.emit(Instruction::CallHelper(helper));
        Ok(())
    }

    pub fn make_closure(&mut self, function: FunctionId) {
        self.emit(Instruction::MakeClosure(function));
    }

    // ========================================================================
    // Completion records
    // ========================================================================

    pub fn normal_completion(&mut self) {
        self.emit(Instruction::NormalCompletion);
    }

    pub fn value_completion(&mut self) {
        self.emit(Instruction::ValueCompletion);
    }

    pub fn break_completion(&mut self, target: Option<String>) {
        self.emit(Instruction::BreakCompletion(target));
    }

    pub fn continue_completion(&mut self, target: Option<String>) {
        self.emit(Instruction::ContinueCompletion(target));
    }

    pub fn return_completion(&mut self) {
        self.emit(Instruction::ReturnCompletion);
    }

    pub fn throw_completion(&mut self) {
        self.emit(Instruction::ThrowCompletion);
    }

    pub fn jump_if_abrupt(&mut self, label: Label) {
        self.emit(Instruction::JumpIfAbrupt(label));
    }

    pub fn jump_if_kind(&mut self, kind: CompletionKind, label: Label) {
        self.emit(Instruction::JumpIfKind(kind, label));
    }

    pub fn jump_if_not_kind(&mut self, kind: CompletionKind, label: Label) {
        self.emit(Instruction::JumpIfNotKind(kind, label));
    }

    pub fn jump_if_breaks_here(&mut self, labels: &LabelSet, target: Label) {
        self.emit(Instruction::JumpIfBreaksHere {
            labels: labels.clone(),
            target,
        });
    }

    pub fn jump_if_continues_here(&mut self, labels: &LabelSet, target: Label) {
        self.emit(Instruction::JumpIfContinuesHere {
            labels: labels.clone(),
            target,
        });
    }

    pub fn merge_completion(&mut self) {
        self.emit(Instruction::MergeCompletion);
    }

    pub fn consume_break(&mut self, labels: LabelSet) {
        self.emit(Instruction::ConsumeBreak(labels));
    }

    pub fn unwrap_completion(&mut self) {
        self.emit(Instruction::UnwrapCompletion);
    }

    // ========================================================================
    // Finishing
    // ========================================================================

    /// Resolves labels and produces the unit.
    pub fn finish(self, role: Role, strict: bool) -> Result<CompiledUnit, CompileError> {
        for instruction in &self.instructions {
            if let Some(label) = instruction.jump_target() {
                if !matches!(self.labels.get(label.index()), Some(Some(_))) {
                    return Err(CompileError::UnresolvedLabel {
                        label: label.0,
                        unit: self.unit,
                    });
                }
            }
        }
        // Labels that were created but never referenced or placed resolve to
        // the end of the unit.
        let end = self.instructions.len();
        let labels = self
            .labels
            .iter()
            .map(|offset| offset.unwrap_or(end))
            .collect();
        Ok(CompiledUnit {
            name: self.unit,
            role,
            strict,
            instructions: self.instructions,
            operands: self.operands,
            labels,
            temp_count: self.temp_count,
        })
    }
}
