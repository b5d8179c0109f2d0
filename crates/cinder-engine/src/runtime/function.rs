// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Function representation.

use super::environment::EnvRef;
use crate::compiler::{Artifact, FunctionId, FunctionInfo};
use std::sync::Arc;

/// A function object's internal state: compiled code plus the environment
/// it closed over.
#[derive(Debug, Clone)]
pub struct Closure {
    /// The artifact holding the function's units
    pub artifact: Arc<Artifact>,
    /// Index into the artifact's function table
    pub function: FunctionId,
    /// The captured environment
    pub env: EnvRef,
}

impl Closure {
    pub fn new(artifact: Arc<Artifact>, function: FunctionId, env: EnvRef) -> Self {
        Self {
            artifact,
            function,
            env,
        }
    }

    /// Metadata for the compiled function.
    ///
    /// Closures are only ever created from ids the artifact itself handed
    /// out, so the lookup cannot miss.
    pub fn info(&self) -> &FunctionInfo {
        &self.artifact.functions[self.function.index()]
    }

    /// Returns the arity (number of parameters).
    pub fn arity(&self) -> usize {
        self.info().params.len()
    }

    pub fn name(&self) -> Option<&str> {
        self.info().name.as_deref()
    }
}
