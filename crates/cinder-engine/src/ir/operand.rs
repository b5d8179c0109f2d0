// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

use crate::runtime::{ExecutionContext, Throw, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The classification of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandType {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Variable,
    Temporary,
}

/// A literal known at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Constant {
    pub fn to_value(&self) -> Value {
        match self {
            Constant::Undefined => Value::Undefined,
            Constant::Null => Value::Null,
            Constant::Boolean(b) => Value::Boolean(*b),
            Constant::Number(n) => Value::Number(*n),
            Constant::String(s) => Value::String(s.clone()),
        }
    }
}

/// A named binding, resolved through the context's environment chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A slot in the per-invocation temporary area of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Temporary {
    pub index: u16,
}

impl Temporary {
    pub fn new(index: u16) -> Self {
        Self { index }
    }
}

/// An IR operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Constant(Constant),
    Variable(Variable),
    Temporary(Temporary),
}

/// Interning identity of an operand. Numbers are compared by bit pattern,
/// so `0` and `-0` get separate slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperandKey {
    Undefined,
    Null,
    Boolean(bool),
    Number(u64),
    String(String),
    Variable(String),
    Temporary(u16),
}

impl Operand {
    pub fn constant(constant: Constant) -> Self {
        Operand::Constant(constant)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Operand::Variable(Variable::new(name))
    }

    pub fn temporary(index: u16) -> Self {
        Operand::Temporary(Temporary::new(index))
    }

    pub fn key(&self) -> OperandKey {
        match self {
            Operand::Constant(Constant::Undefined) => OperandKey::Undefined,
            Operand::Constant(Constant::Null) => OperandKey::Null,
            Operand::Constant(Constant::Boolean(b)) => OperandKey::Boolean(*b),
            Operand::Constant(Constant::Number(n)) => OperandKey::Number(n.to_bits()),
            Operand::Constant(Constant::String(s)) => OperandKey::String(s.clone()),
            Operand::Variable(variable) => OperandKey::Variable(variable.name.clone()),
            Operand::Temporary(temp) => OperandKey::Temporary(temp.index),
        }
    }

    pub fn operand_type(&self) -> OperandType {
        match self {
            Operand::Constant(Constant::Undefined) => OperandType::Undefined,
            Operand::Constant(Constant::Null) => OperandType::Null,
            Operand::Constant(Constant::Boolean(_)) => OperandType::Boolean,
            Operand::Constant(Constant::Number(_)) => OperandType::Number,
            Operand::Constant(Constant::String(_)) => OperandType::String,
            Operand::Variable(_) => OperandType::Variable,
            Operand::Temporary(_) => OperandType::Temporary,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Operand::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    /// Produces the operand's runtime value.
    ///
    /// Constants ignore both arguments and yield the same value every time.
    /// Variables resolve through `cx`; temporaries read `temps`, the
    /// temporary area of the current unit invocation.
    pub fn retrieve(&self, cx: &ExecutionContext<'_>, temps: &[Value]) -> Result<Value, Throw> {
        match self {
            Operand::Constant(constant) => Ok(constant.to_value()),
            Operand::Variable(variable) => cx.resolve(&variable.name),
            Operand::Temporary(temp) => Ok(temps
                .get(temp.index as usize)
                .cloned()
                .unwrap_or(Value::Undefined)),
        }
    }

    /// Appends every variable this operand reads, transitively.
    pub fn add_used_variables<'a>(&'a self, out: &mut Vec<&'a Variable>) {
        if let Operand::Variable(variable) = self {
            if !out.contains(&variable) {
                out.push(variable);
            }
        }
    }

    pub fn used_variables(&self) -> Vec<&Variable> {
        let mut out = Vec::new();
        self.add_used_variables(&mut out);
        out
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(Constant::String(s)) => write!(f, "{:?}", s),
            Operand::Constant(constant) => write!(f, "{}", constant.to_value()),
            Operand::Variable(variable) => write!(f, "{}", variable.name),
            Operand::Temporary(temp) => write!(f, "%t{}", temp.index),
        }
    }
}
