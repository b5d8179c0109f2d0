// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical environments for variable binding.

use super::value::Value;
use rustc_hash::FxHashMap;

/// Handle to an environment in the realm's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvRef(pub(crate) usize);

/// A lexical environment for variable bindings.
///
/// Closures capture environments by handle, so an environment outlives the
/// call that created it.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// The bindings in this environment
    bindings: FxHashMap<String, Binding>,
    /// The outer (parent) environment
    outer: Option<EnvRef>,
}

impl Environment {
    /// Creates a new environment with an optional outer environment.
    pub fn new(outer: Option<EnvRef>) -> Self {
        Self {
            bindings: FxHashMap::default(),
            outer,
        }
    }

    pub fn outer(&self) -> Option<EnvRef> {
        self.outer
    }

    /// Declares a binding initialized to undefined, unless one already exists.
    pub fn declare(&mut self, name: &str, deletable: bool) {
        if !self.bindings.contains_key(name) {
            self.bindings.insert(
                name.to_string(),
                Binding {
                    value: Value::Undefined,
                    deletable,
                },
            );
        }
    }

    /// Sets a binding in this environment, creating it if needed.
    pub fn initialize(&mut self, name: &str, value: Value) {
        match self.bindings.get_mut(name) {
            Some(binding) => binding.value = value,
            None => {
                self.bindings.insert(
                    name.to_string(),
                    Binding {
                        value,
                        deletable: false,
                    },
                );
            }
        }
    }

    /// Gets an own binding's value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name).map(|binding| &binding.value)
    }

    /// Overwrites an own binding. Returns false if it does not exist.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                binding.value = value;
                true
            }
            None => false,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Removes a deletable binding. Returns false for declared bindings.
    pub fn delete(&mut self, name: &str) -> bool {
        match self.bindings.get(name) {
            Some(binding) if !binding.deletable => false,
            Some(_) => {
                self.bindings.remove(name);
                true
            }
            None => true,
        }
    }
}

/// A variable binding.
#[derive(Debug, Clone)]
struct Binding {
    /// The value
    value: Value,
    /// Implicit globals created by sloppy assignment can be deleted
    deletable: bool,
}
