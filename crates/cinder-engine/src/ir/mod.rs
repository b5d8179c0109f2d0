// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lightweight intermediate representation for values consumed by
//! instructions.
//!
//! Literals and identifier reads compile to a single operand load instead of
//! a visitor round trip. Operands compose by reference: instructions hold an
//! index into their unit's operand table.

mod operand;

pub use operand::{Constant, Operand, OperandKey, OperandType, Temporary, Variable};
