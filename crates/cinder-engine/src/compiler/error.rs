// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Compile-time failures.

use thiserror::Error;

/// Errors raised while turning a program tree into compiled units.
///
/// `unit` is the name of the unit being generated when the error occurred;
/// it stands in for a source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A construct the code generator has no lowering for
    #[error("unsupported construct: {construct} (in {unit})")]
    UnsupportedConstruct { construct: String, unit: String },

    /// A jump references a label that was never placed
    #[error("unresolved label L{label} in {unit}")]
    UnresolvedLabel { label: u32, unit: String },

    /// A label was placed twice
    #[error("label L{label} defined twice in {unit}")]
    DuplicateLabel { label: u32, unit: String },

    /// Two units received the same name
    #[error("duplicate unit name: {0}")]
    DuplicateUnitName(String),

    /// A helper call was emitted with the wrong number of arguments
    #[error("helper {helper} takes {expected} arguments, {supplied} supplied (in {unit})")]
    HelperArityMismatch {
        helper: &'static str,
        expected: usize,
        supplied: usize,
        unit: String,
    },

    /// A reserved unit was never filled in. Indicates a code generator bug:
    /// errors in a unit's body propagate before the artifact is assembled.
    #[error("unit {0} was reserved but never finished")]
    UnfinishedUnit(String),

    /// A unit outgrew one of its index spaces
    #[error("too many {what} in {unit}")]
    TooManyOperands { what: &'static str, unit: String },
}

impl CompileError {
    pub fn unsupported(construct: impl Into<String>, unit: &str) -> Self {
        CompileError::UnsupportedConstruct {
            construct: construct.into(),
            unit: unit.to_string(),
        }
    }
}
