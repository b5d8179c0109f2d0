// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bytecode definitions.
//!
//! The stack holds two kinds of entries: values and completion records.
//! Statement code always leaves exactly one completion; expression code
//! always leaves exactly one value.

use super::completion::{CompletionKind, LabelSet};
use super::helpers::Helper;
use crate::ir::{Operand, Temporary, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A symbolic jump target, resolved to an offset when its unit is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label(pub(crate) u32);

impl Label {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Index of a compiled unit in its artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub(crate) u32);

impl UnitId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a function in its artifact's function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(pub(crate) u32);

impl FunctionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into a unit's operand table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperandIndex(pub(crate) u16);

impl OperandIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The construct a compiled unit was produced for. Unit names are the role
/// tag followed by a per-role counter, e.g. `Then_0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Program,
    Function,
    Then,
    Else,
    Body,
    Case,
    Default,
    Catch,
    Finally,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Program,
        Role::Function,
        Role::Then,
        Role::Else,
        Role::Body,
        Role::Case,
        Role::Default,
        Role::Catch,
        Role::Finally,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Role::Program => "Program",
            Role::Function => "Function",
            Role::Then => "Then",
            Role::Else => "Else",
            Role::Body => "Body",
            Role::Case => "Case",
            Role::Default => "Default",
            Role::Catch => "Catch",
            Role::Finally => "Finally",
        }
    }
}

/// A single instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // ------------------------------------------------------------------
    // Operands and bindings
    // ------------------------------------------------------------------
    /// Push the value of an operand.
    Load(OperandIndex),
    /// Assign the top value to a variable operand, leaving it on the stack.
    Store { variable: OperandIndex, strict: bool },
    /// Pop into a temporary.
    StoreTemp(Temporary),
    /// Push the context's this-binding.
    LoadThis,
    /// Push `typeof name`, which is "undefined" for unresolvable names.
    TypeOfVariable(OperandIndex),
    /// Push the result of `delete name`.
    DeleteVariable(OperandIndex),
    /// Hoisted `var`: bind to undefined unless already bound.
    DeclareVariable(OperandIndex),
    /// Pop into a binding of the current environment, creating it if needed.
    InitializeBinding(OperandIndex),
    /// Push a new function object closing over the current environment.
    MakeClosure(FunctionId),

    // ------------------------------------------------------------------
    // Stack shuffling
    // ------------------------------------------------------------------
    Pop,
    /// Duplicate the top entry.
    Dup,
    /// Duplicate the top two entries.
    Dup2,
    /// Swap the top two entries.
    Swap,
    Nop,

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------
    Jump(Label),
    /// Pop a value; jump if it is falsy.
    JumpIfFalse(Label),
    /// Pop a value; jump if it is truthy.
    JumpIfTrue(Label),
    /// Run another unit against the current context and push its completion.
    InvokeUnit(UnitId),
    /// Run a runtime helper.
    CallHelper(Helper),
    /// Pop a value into a fresh scope binding `name`.
    EnterCatchScope(OperandIndex),
    /// Leave the innermost catch scope.
    ExitScope,
    /// Advance a for-in cursor: push the next key still present on the
    /// object, or jump when exhausted. The key array lives in `keys`, the
    /// cursor in the slot after it and the enumerated object after that.
    ForInStep { keys: Temporary, exhausted: Label },

    // ------------------------------------------------------------------
    // Completion records
    // ------------------------------------------------------------------
    /// Push NORMAL with no value.
    NormalCompletion,
    /// Pop a value; push NORMAL carrying it.
    ValueCompletion,
    BreakCompletion(Option<String>),
    ContinueCompletion(Option<String>),
    /// Pop a value; push RETURN carrying it.
    ReturnCompletion,
    /// Pop a value; push THROW carrying it.
    ThrowCompletion,
    /// Jump if the top completion is not NORMAL. Does not pop.
    JumpIfAbrupt(Label),
    /// Jump if the top completion has the given kind. Does not pop.
    JumpIfKind(CompletionKind, Label),
    /// Jump unless the top completion has the given kind. Does not pop.
    JumpIfNotKind(CompletionKind, Label),
    /// Jump if the top completion is a BREAK this label set handles.
    JumpIfBreaksHere { labels: LabelSet, target: Label },
    /// Jump if the top completion is a CONTINUE this label set handles.
    JumpIfContinuesHere { labels: LabelSet, target: Label },
    /// Pop a completion and the accumulator below it; push NORMAL with the
    /// newer value, or the accumulator's if the newer one is empty.
    MergeCompletion,
    /// Turn a BREAK aimed at one of these labels into NORMAL.
    ConsumeBreak(LabelSet),
    /// Pop a completion; push its value, or undefined.
    UnwrapCompletion,
}

impl Instruction {
    /// The jump target, if this instruction can branch.
    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Instruction::Jump(label)
            | Instruction::JumpIfFalse(label)
            | Instruction::JumpIfTrue(label)
            | Instruction::JumpIfAbrupt(label)
            | Instruction::JumpIfKind(_, label)
            | Instruction::JumpIfNotKind(_, label) => Some(*label),
            Instruction::ForInStep { exhausted, .. } => Some(*exhausted),
            Instruction::JumpIfBreaksHere { target, .. }
            | Instruction::JumpIfContinuesHere { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// The unit this instruction invokes, if any.
    pub fn invoked_unit(&self) -> Option<UnitId> {
        match self {
            Instruction::InvokeUnit(unit) => Some(*unit),
            _ => None,
        }
    }
}

/// A self-contained, separately invocable chunk of code produced from one
/// syntactic body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledUnit {
    /// Unique name within the artifact
    pub name: String,
    pub role: Role,
    pub strict: bool,
    pub instructions: Vec<Instruction>,
    /// Operands referenced by index from the instructions
    pub operands: Vec<Operand>,
    /// Resolved offset of every label
    pub labels: Vec<usize>,
    /// Size of the per-invocation temporary area
    pub temp_count: u16,
}

impl CompiledUnit {
    pub fn operand(&self, index: OperandIndex) -> Option<&Operand> {
        self.operands.get(index.index())
    }

    /// Offset a label resolved to.
    pub fn label_offset(&self, label: Label) -> Option<usize> {
        self.labels.get(label.index()).copied()
    }

    /// Every variable this unit's operands read.
    pub fn used_variables(&self) -> Vec<&Variable> {
        let mut out = Vec::new();
        for operand in &self.operands {
            operand.add_used_variables(&mut out);
        }
        out
    }

    /// Units invoked directly from this one, in emission order.
    pub fn invoked_units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.instructions.iter().filter_map(Instruction::invoked_unit)
    }
}

/// Metadata for a compiled function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// The unit holding the function body
    pub unit: UnitId,
    pub name: Option<String>,
    pub params: Vec<String>,
    pub strict: bool,
    /// Named function expressions bind their own name in a scope between
    /// the closure and the captured environment.
    pub self_binding: bool,
}

/// The result of compiling one program: every unit plus the function table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub entry: UnitId,
    pub units: Vec<CompiledUnit>,
    pub functions: Vec<FunctionInfo>,
}

impl Artifact {
    pub fn unit(&self, id: UnitId) -> Option<&CompiledUnit> {
        self.units.get(id.index())
    }

    pub fn entry_unit(&self) -> Option<&CompiledUnit> {
        self.unit(self.entry)
    }

    pub fn unit_by_name(&self, name: &str) -> Option<&CompiledUnit> {
        self.units.iter().find(|unit| unit.name == name)
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionInfo> {
        self.functions.get(id.index())
    }

    /// Units with the given role, in creation order.
    pub fn units_with_role(&self, role: Role) -> impl Iterator<Item = &CompiledUnit> + '_ {
        self.units.iter().filter(move |unit| unit.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_targets() {
        let label = Label(3);
        assert_eq!(Instruction::Jump(label).jump_target(), Some(label));
        assert_eq!(
            Instruction::JumpIfBreaksHere {
                labels: LabelSet::default(),
                target: label
            }
            .jump_target(),
            Some(label)
        );
        assert_eq!(Instruction::Pop.jump_target(), None);
    }

    #[test]
    fn test_role_tags_are_distinct() {
        let mut tags: Vec<_> = Role::ALL.iter().map(|role| role.tag()).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), Role::ALL.len());
    }
}
