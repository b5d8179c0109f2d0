// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Reference runtime: values, objects, environments and execution contexts.

pub mod context;
pub mod environment;
pub mod error;
pub mod function;
pub mod object;
pub mod realm;
pub mod value;

pub use context::ExecutionContext;
pub use environment::{EnvRef, Environment};
pub use error::{ErrorKind, Throw};
pub use function::Closure;
pub use object::{ObjectKind, ObjectRef, Property, RuntimeObject};
pub use realm::{DEFAULT_MAX_CALL_DEPTH, Realm};
pub use value::Value;
