// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script-level exceptions raised by runtime operations.

use super::value::Value;
use std::fmt;

/// The built-in error categories the runtime raises on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TypeError,
    ReferenceError,
    RangeError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
        }
    }
}

/// A thrown value on its way out of a runtime operation.
///
/// Faults detected by the runtime carry only a kind and message; the realm
/// turns them into error objects when the enclosing unit reports a THROW
/// completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Throw {
    /// A value thrown by script code
    Value(Value),
    /// A fault raised by the runtime
    Error { kind: ErrorKind, message: String },
}

impl Throw {
    pub fn type_error(message: impl Into<String>) -> Self {
        Throw::Error {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Throw::Error {
            kind: ErrorKind::ReferenceError,
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Throw::Error {
            kind: ErrorKind::RangeError,
            message: message.into(),
        }
    }
}

impl fmt::Display for Throw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throw::Value(value) => write!(f, "uncaught {}", value),
            Throw::Error { kind, message } => write!(f, "{}: {}", kind.name(), message),
        }
    }
}
