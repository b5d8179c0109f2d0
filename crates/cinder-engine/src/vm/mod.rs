// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The unit virtual machine.
//!
//! ## Structure
//!
//! - `interpreter` - runs compiled units against an execution context
//! - `helpers` - the runtime helper operations
//! - `comparison` - equality and relational comparison (ES3 11.8.5, 11.9)

mod interpreter;

pub mod comparison;
pub mod helpers;

pub use interpreter::{Interpreter, run_program};

use crate::compiler::CompletionKind;
use thiserror::Error;

/// Faults in compiled code itself, as opposed to script-level throws.
///
/// Script errors never surface here: they become THROW completions. A
/// `VmError` means an artifact broke an invariant the compiler guarantees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("unit #{0} is not in the artifact")]
    MissingUnit(usize),

    #[error("function #{0} is not in the artifact")]
    MissingFunction(usize),

    #[error("operand #{index} is missing from {unit}")]
    MissingOperand { unit: String, index: usize },

    #[error("operand #{index} of {unit} is not a variable")]
    NotAVariable { unit: String, index: usize },

    #[error("temporary %t{index} is out of range in {unit}")]
    MissingTemporary { unit: String, index: u16 },

    #[error("label L{label} is not resolved in {unit}")]
    MissingLabel { unit: String, label: usize },

    #[error("stack underflow at {unit}:{ip}")]
    StackUnderflow { unit: String, ip: usize },

    #[error("expected a {expected} on the stack at {unit}:{ip}")]
    SlotMismatch {
        unit: String,
        ip: usize,
        expected: &'static str,
    },

    #[error("scope exit without a matching catch scope in {unit}")]
    ScopeUnderflow { unit: String },

    /// A unit finished with something other than a single completion
    #[error("{unit} finished with {depth} stack entries instead of one completion")]
    UnbalancedUnit { unit: String, depth: usize },

    /// A BREAK or CONTINUE left a function or program body
    #[error("{kind} completion escaped {unit}")]
    EscapedCompletion { kind: CompletionKind, unit: String },
}
