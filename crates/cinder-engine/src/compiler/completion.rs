// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Completion records.
//!
//! Every statement, and every compiled unit, finishes with a completion. The
//! enclosing code inspects the kind to decide whether control continues,
//! jumps to a loop or label exit, or propagates outward.

use crate::runtime::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome category of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionKind {
    Normal,
    Break,
    Continue,
    Return,
    Throw,
}

impl CompletionKind {
    pub fn name(self) -> &'static str {
        match self {
            CompletionKind::Normal => "NORMAL",
            CompletionKind::Break => "BREAK",
            CompletionKind::Continue => "CONTINUE",
            CompletionKind::Return => "RETURN",
            CompletionKind::Throw => "THROW",
        }
    }
}

impl fmt::Display for CompletionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A completion record: kind, optional value, optional label target.
///
/// `target` is only meaningful for BREAK and CONTINUE; `None` there means
/// the nearest enclosing loop (or switch, for BREAK).
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub kind: CompletionKind,
    pub value: Option<Value>,
    pub target: Option<String>,
}

impl Completion {
    /// NORMAL with no value.
    pub fn normal() -> Self {
        Self {
            kind: CompletionKind::Normal,
            value: None,
            target: None,
        }
    }

    pub fn normal_with(value: Value) -> Self {
        Self {
            kind: CompletionKind::Normal,
            value: Some(value),
            target: None,
        }
    }

    pub fn break_to(target: Option<String>) -> Self {
        Self {
            kind: CompletionKind::Break,
            value: None,
            target,
        }
    }

    pub fn continue_to(target: Option<String>) -> Self {
        Self {
            kind: CompletionKind::Continue,
            value: None,
            target,
        }
    }

    pub fn return_with(value: Value) -> Self {
        Self {
            kind: CompletionKind::Return,
            value: Some(value),
            target: None,
        }
    }

    pub fn throw(value: Value) -> Self {
        Self {
            kind: CompletionKind::Throw,
            value: Some(value),
            target: None,
        }
    }

    pub fn is_abrupt(&self) -> bool {
        self.kind != CompletionKind::Normal
    }

    /// Folds this statement's completion into a running statement-list
    /// result: the newest value wins, an absent value keeps the previous one.
    pub fn update_empty(self, previous: Option<Value>) -> Self {
        Self {
            value: self.value.or(previous),
            ..self
        }
    }

    /// The carried value, or undefined.
    pub fn value_or_undefined(&self) -> Value {
        self.value.clone().unwrap_or(Value::Undefined)
    }
}

/// The statement labels attached to a loop, switch or labeled statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelSet {
    pub names: Vec<String>,
}

impl LabelSet {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Whether a loop or switch owning this set handles a BREAK or CONTINUE
    /// with `target`: unlabeled ones always, labeled ones when named here.
    pub fn handles(&self, target: Option<&str>) -> bool {
        target.is_none_or(|name| self.contains(name))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}
