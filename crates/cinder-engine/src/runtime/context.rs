// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution contexts.

use super::environment::EnvRef;
use super::error::Throw;
use super::realm::Realm;
use super::value::Value;

/// The state a compiled unit runs against: the realm, the current lexical
/// environment, the this-binding and the strict-mode flag.
///
/// A unit invocation borrows the caller's context, so nested units see the
/// same environment and `this` as the code that invoked them.
#[derive(Debug)]
pub struct ExecutionContext<'r> {
    pub realm: &'r mut Realm,
    pub env: EnvRef,
    pub this_binding: Value,
    pub strict: bool,
}

impl<'r> ExecutionContext<'r> {
    /// The context for top-level program code.
    pub fn global(realm: &'r mut Realm, strict: bool) -> Self {
        let env = realm.global_env();
        let this_binding = Value::Object(realm.global_object());
        Self {
            realm,
            env,
            this_binding,
            strict,
        }
    }

    /// The context for a function body.
    pub fn function(realm: &'r mut Realm, env: EnvRef, this_binding: Value, strict: bool) -> Self {
        Self {
            realm,
            env,
            this_binding,
            strict,
        }
    }

    pub fn this_binding(&self) -> &Value {
        &self.this_binding
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Reads a binding, failing with a ReferenceError if it cannot be resolved.
    pub fn resolve(&self, name: &str) -> Result<Value, Throw> {
        self.realm
            .lookup(self.env, name)
            .ok_or_else(|| Throw::reference_error(format!("{} is not defined", name)))
    }

    /// Writes a binding with the given strictness.
    pub fn assign(&mut self, name: &str, value: Value, strict: bool) -> Result<(), Throw> {
        self.realm.assign(self.env, name, value, strict)
    }
}
