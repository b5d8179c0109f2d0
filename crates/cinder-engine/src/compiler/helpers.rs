// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The runtime helper catalog.
//!
//! Helpers implement the language's abstract operations. Generated code
//! calls them with a fixed number of stack arguments; the emitter checks the
//! supplied count against [`Helper::arity`] when the call is emitted, and the
//! interpreter runs the operation in `vm::helpers`.
//!
//! | Helper | Stack in | Stack out |
//! |--------|----------|-----------|
//! | `ToBoolean`, `ToNumber`, `Negate`, `BitNot`, `Not`, `TypeOf` | v | r |
//! | arithmetic, bitwise, relational, equality, `In`, `InstanceOf` | a b | r |
//! | `GetProperty` | obj key | v |
//! | `PutProperty` | obj key v | v |
//! | `DeleteProperty` | obj key | bool |
//! | `DefineProperty` | obj key v | obj |
//! | `NewObject` | | obj |
//! | `NewArray { len }` | e0..eN | array |
//! | `NewRegExp` | pattern flags | regexp |
//! | `Call { argc }` | this f a0..aN | r |
//! | `Construct { argc }` | f a0..aN | obj |
//! | `EnumerateKeys` | obj | keys |
//! | `Print` | v | undefined |

use crate::ast::{BinaryOperator, UnaryOperator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A runtime helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Helper {
    // Conversions
    ToBoolean,
    ToNumber,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,

    // Bitwise
    ShiftLeft,
    ShiftRight,
    ShiftRightUnsigned,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,

    // Logical and type
    Not,
    TypeOf,

    // Comparison
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    In,
    InstanceOf,

    // Properties
    GetProperty,
    PutProperty { strict: bool },
    DeleteProperty { strict: bool },
    DefineProperty,

    // Allocation
    NewObject,
    NewArray { len: u32 },
    NewRegExp,

    // Calls
    Call { argc: u16 },
    Construct { argc: u16 },

    // Iteration and host
    EnumerateKeys,
    Print,
}

impl Helper {
    /// Number of stack arguments the helper consumes.
    pub fn arity(self) -> usize {
        use Helper::*;
        match self {
            NewObject => 0,
            ToBoolean | ToNumber | Negate | BitNot | Not | TypeOf | EnumerateKeys | Print => 1,
            Add | Subtract | Multiply | Divide | Modulo | ShiftLeft | ShiftRight
            | ShiftRightUnsigned | BitAnd | BitOr | BitXor | LessThan | GreaterThan
            | LessEqual | GreaterEqual | Equal | NotEqual | StrictEqual | StrictNotEqual | In
            | InstanceOf | GetProperty | DeleteProperty { .. } | NewRegExp => 2,
            PutProperty { .. } | DefineProperty => 3,
            NewArray { len } => len as usize,
            Call { argc } => argc as usize + 2,
            Construct { argc } => argc as usize + 1,
        }
    }

    pub fn name(self) -> &'static str {
        use Helper::*;
        match self {
            ToBoolean => "ToBoolean",
            ToNumber => "ToNumber",
            Add => "Add",
            Subtract => "Subtract",
            Multiply => "Multiply",
            Divide => "Divide",
            Modulo => "Modulo",
            Negate => "Negate",
            ShiftLeft => "ShiftLeft",
            ShiftRight => "ShiftRight",
            ShiftRightUnsigned => "ShiftRightUnsigned",
            BitAnd => "BitAnd",
            BitOr => "BitOr",
            BitXor => "BitXor",
            BitNot => "BitNot",
            Not => "Not",
            TypeOf => "TypeOf",
            LessThan => "LessThan",
            GreaterThan => "GreaterThan",
            LessEqual => "LessEqual",
            GreaterEqual => "GreaterEqual",
            Equal => "Equal",
            NotEqual => "NotEqual",
            StrictEqual => "StrictEqual",
            StrictNotEqual => "StrictNotEqual",
            In => "In",
            InstanceOf => "InstanceOf",
            GetProperty => "GetProperty",
            PutProperty { .. } => "PutProperty",
            DeleteProperty { .. } => "DeleteProperty",
            DefineProperty => "DefineProperty",
            NewObject => "NewObject",
            NewArray { .. } => "NewArray",
            NewRegExp => "NewRegExp",
            Call { .. } => "Call",
            Construct { .. } => "Construct",
            EnumerateKeys => "EnumerateKeys",
            Print => "Print",
        }
    }

    /// The helper implementing a binary operator.
    pub fn for_binary(op: BinaryOperator) -> Self {
        match op {
            BinaryOperator::Add => Helper::Add,
            BinaryOperator::Subtract => Helper::Subtract,
            BinaryOperator::Multiply => Helper::Multiply,
            BinaryOperator::Divide => Helper::Divide,
            BinaryOperator::Modulo => Helper::Modulo,
            BinaryOperator::Equal => Helper::Equal,
            BinaryOperator::NotEqual => Helper::NotEqual,
            BinaryOperator::StrictEqual => Helper::StrictEqual,
            BinaryOperator::StrictNotEqual => Helper::StrictNotEqual,
            BinaryOperator::LessThan => Helper::LessThan,
            BinaryOperator::LessThanEqual => Helper::LessEqual,
            BinaryOperator::GreaterThan => Helper::GreaterThan,
            BinaryOperator::GreaterThanEqual => Helper::GreaterEqual,
            BinaryOperator::BitwiseAnd => Helper::BitAnd,
            BinaryOperator::BitwiseOr => Helper::BitOr,
            BinaryOperator::BitwiseXor => Helper::BitXor,
            BinaryOperator::LeftShift => Helper::ShiftLeft,
            BinaryOperator::RightShift => Helper::ShiftRight,
            BinaryOperator::UnsignedRightShift => Helper::ShiftRightUnsigned,
            BinaryOperator::In => Helper::In,
            BinaryOperator::InstanceOf => Helper::InstanceOf,
        }
    }

    /// The helper implementing a value-level unary operator. `typeof` on a
    /// bare identifier, `void` and `delete` are compiled structurally and
    /// have no helper here.
    pub fn for_unary(op: UnaryOperator) -> Option<Self> {
        match op {
            UnaryOperator::Minus => Some(Helper::Negate),
            UnaryOperator::Plus => Some(Helper::ToNumber),
            UnaryOperator::Not => Some(Helper::Not),
            UnaryOperator::BitwiseNot => Some(Helper::BitNot),
            UnaryOperator::Typeof => Some(Helper::TypeOf),
            UnaryOperator::Void | UnaryOperator::Delete => None,
        }
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Helper::PutProperty { strict: true } | Helper::DeleteProperty { strict: true } => {
                write!(f, "{} strict", self.name())
            }
            Helper::NewArray { len } => write!(f, "{} {}", self.name(), len),
            Helper::Call { argc } | Helper::Construct { argc } => {
                write!(f, "{} {}", self.name(), argc)
            }
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_arity_counts_receiver_and_callee() {
        assert_eq!(Helper::Call { argc: 0 }.arity(), 2);
        assert_eq!(Helper::Call { argc: 3 }.arity(), 5);
        assert_eq!(Helper::Construct { argc: 1 }.arity(), 2);
    }

    #[test]
    fn test_fixed_arities() {
        assert_eq!(Helper::NewObject.arity(), 0);
        assert_eq!(Helper::ToBoolean.arity(), 1);
        assert_eq!(Helper::GetProperty.arity(), 2);
        assert_eq!(Helper::PutProperty { strict: false }.arity(), 3);
        assert_eq!(Helper::NewArray { len: 4 }.arity(), 4);
    }

    #[test]
    fn test_operator_mapping() {
        assert_eq!(
            Helper::for_binary(BinaryOperator::UnsignedRightShift),
            Helper::ShiftRightUnsigned
        );
        assert_eq!(Helper::for_unary(UnaryOperator::Void), None);
        assert_eq!(Helper::for_unary(UnaryOperator::Plus), Some(Helper::ToNumber));
    }

    #[test]
    fn test_display() {
        assert_eq!(Helper::Call { argc: 2 }.to_string(), "Call 2");
        assert_eq!(Helper::PutProperty { strict: true }.to_string(), "PutProperty strict");
        assert_eq!(Helper::Add.to_string(), "Add");
    }
}
