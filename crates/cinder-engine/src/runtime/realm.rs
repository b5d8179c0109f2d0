// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The realm: object and environment arenas plus the global state every
//! execution context shares.

use super::environment::{EnvRef, Environment};
use super::error::Throw;
use super::function::Closure;
use super::object::{ObjectKind, ObjectRef, Property, RuntimeObject, array_index};
use super::value::{Value, number_to_string, string_to_number};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Default limit on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Shared runtime state.
///
/// Objects and environments live in append-only arenas: nothing is ever
/// reclaimed. Every function call adds an environment and an `arguments`
/// array, so a realm kept alive across many evaluations (as [`Engine`] and
/// `AsyncEngine` do) grows for as long as it is used.
///
/// [`Engine`]: crate::Engine
#[derive(Debug)]
pub struct Realm {
    objects: Vec<RuntimeObject>,
    environments: Vec<Environment>,
    global_env: EnvRef,
    global_object: ObjectRef,
    object_prototype: ObjectRef,
    function_prototype: ObjectRef,
    array_prototype: ObjectRef,
    error_prototype: ObjectRef,
    output: Vec<String>,
    call_depth: usize,
    max_call_depth: usize,
    trace_units: bool,
    unit_invocations: FxHashMap<String, usize>,
}

impl Realm {
    /// Creates a realm with the default call depth limit.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_CALL_DEPTH, false)
    }

    /// Creates a realm with an explicit call depth limit. With `trace_units`
    /// set, every unit invocation is counted by unit name.
    pub fn with_limits(max_call_depth: usize, trace_units: bool) -> Self {
        let mut objects = Vec::new();
        let mut alloc = |object: RuntimeObject| {
            objects.push(object);
            ObjectRef(objects.len() - 1)
        };
        let object_prototype = alloc(RuntimeObject::new(ObjectKind::Ordinary, None));
        let function_prototype = alloc(RuntimeObject::new(
            ObjectKind::Ordinary,
            Some(object_prototype),
        ));
        let array_prototype = alloc(RuntimeObject::new(
            ObjectKind::Ordinary,
            Some(object_prototype),
        ));
        let error_prototype = alloc(RuntimeObject::new(
            ObjectKind::Ordinary,
            Some(object_prototype),
        ));
        let global_object = alloc(RuntimeObject::new(
            ObjectKind::Ordinary,
            Some(object_prototype),
        ));

        let mut global = Environment::new(None);
        global.initialize("undefined", Value::Undefined);
        global.initialize("NaN", Value::Number(f64::NAN));
        global.initialize("Infinity", Value::Number(f64::INFINITY));

        let mut realm = Self {
            objects,
            environments: vec![global],
            global_env: EnvRef(0),
            global_object,
            object_prototype,
            function_prototype,
            array_prototype,
            error_prototype,
            output: Vec::new(),
            call_depth: 0,
            max_call_depth,
            trace_units,
            unit_invocations: FxHashMap::default(),
        };
        realm
            .object_mut(error_prototype)
            .define("name", Property::hidden(Value::from("Error")));
        realm
            .object_mut(error_prototype)
            .define("message", Property::hidden(Value::from("")));
        realm
    }

    pub fn global_env(&self) -> EnvRef {
        self.global_env
    }

    pub fn global_object(&self) -> ObjectRef {
        self.global_object
    }

    // ========================================================================
    // Arenas
    // ========================================================================

    pub fn alloc(&mut self, object: RuntimeObject) -> ObjectRef {
        self.objects.push(object);
        ObjectRef(self.objects.len() - 1)
    }

    /// Handles are only minted by this realm, so lookups cannot miss.
    pub fn object(&self, handle: ObjectRef) -> &RuntimeObject {
        &self.objects[handle.0]
    }

    pub fn object_mut(&mut self, handle: ObjectRef) -> &mut RuntimeObject {
        &mut self.objects[handle.0]
    }

    pub fn new_env(&mut self, outer: Option<EnvRef>) -> EnvRef {
        self.environments.push(Environment::new(outer));
        EnvRef(self.environments.len() - 1)
    }

    pub fn env(&self, handle: EnvRef) -> &Environment {
        &self.environments[handle.0]
    }

    pub fn env_mut(&mut self, handle: EnvRef) -> &mut Environment {
        &mut self.environments[handle.0]
    }

    // ========================================================================
    // Object creation
    // ========================================================================

    pub fn new_object(&mut self) -> ObjectRef {
        self.alloc(RuntimeObject::new(
            ObjectKind::Ordinary,
            Some(self.object_prototype),
        ))
    }

    /// Creates an object whose prototype is `prototype`, or the default
    /// object prototype when that is not an object.
    pub fn new_object_with_prototype(&mut self, prototype: &Value) -> ObjectRef {
        let prototype = prototype.as_object().unwrap_or(self.object_prototype);
        self.alloc(RuntimeObject::new(ObjectKind::Ordinary, Some(prototype)))
    }

    pub fn new_array(&mut self, elements: Vec<Value>) -> ObjectRef {
        let mut array = RuntimeObject::new(ObjectKind::Array, Some(self.array_prototype));
        array.define(
            "length",
            Property::hidden(Value::Number(elements.len() as f64)),
        );
        for (index, element) in elements.into_iter().enumerate() {
            array.set(&index.to_string(), element);
        }
        self.alloc(array)
    }

    pub fn new_error(&mut self, name: &str, message: &str) -> ObjectRef {
        let mut error = RuntimeObject::new(ObjectKind::Error, Some(self.error_prototype));
        error.define("name", Property::hidden(Value::from(name)));
        error.define("message", Property::hidden(Value::from(message)));
        self.alloc(error)
    }

    pub fn new_regexp(&mut self, pattern: &str, flags: &str) -> ObjectRef {
        let mut regexp = RuntimeObject::new(
            ObjectKind::RegExp {
                pattern: pattern.to_string(),
                flags: flags.to_string(),
            },
            Some(self.object_prototype),
        );
        regexp.define("source", Property::hidden(Value::from(pattern)));
        regexp.define("global", Property::hidden(Value::Boolean(flags.contains('g'))));
        regexp.define(
            "ignoreCase",
            Property::hidden(Value::Boolean(flags.contains('i'))),
        );
        regexp.define(
            "multiline",
            Property::hidden(Value::Boolean(flags.contains('m'))),
        );
        regexp.define("lastIndex", Property::hidden(Value::Number(0.0)));
        self.alloc(regexp)
    }

    /// Creates a function object with its own `prototype` object.
    pub fn new_function(&mut self, closure: Closure) -> ObjectRef {
        let arity = closure.arity();
        let name = closure.name().unwrap_or_default().to_string();
        let function = self.alloc(RuntimeObject::new(
            ObjectKind::Function(closure),
            Some(self.function_prototype),
        ));
        let prototype = self.new_object();
        self.object_mut(prototype).define(
            "constructor",
            Property {
                value: Value::Object(function),
                writable: true,
                enumerable: false,
                configurable: true,
            },
        );
        let object = self.object_mut(function);
        object.define("prototype", Property::hidden(Value::Object(prototype)));
        object.define("length", Property::hidden(Value::Number(arity as f64)));
        object.define("name", Property::hidden(Value::String(name)));
        function
    }

    /// Turns a thrown fault into the value script code observes.
    pub fn materialize(&mut self, throw: Throw) -> Value {
        match throw {
            Throw::Value(value) => value,
            Throw::Error { kind, message } => Value::Object(self.new_error(kind.name(), &message)),
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Property read with prototype lookup. Primitive bases expose string
    /// length and indices; everything else reads as undefined.
    pub fn get(&self, base: &Value, key: &str) -> Result<Value, Throw> {
        match base {
            Value::Undefined | Value::Null => Err(Throw::type_error(format!(
                "cannot read property '{}' of {}",
                key, base
            ))),
            Value::Object(handle) => Ok(self.get_from(*handle, key)),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.encode_utf16().count() as f64));
                }
                Ok(array_index(key)
                    .and_then(|index| {
                        let units: Vec<u16> = s.encode_utf16().collect();
                        units
                            .get(index as usize)
                            .map(|unit| String::from_utf16_lossy(&[*unit]))
                    })
                    .map(Value::String)
                    .unwrap_or(Value::Undefined))
            }
            Value::Boolean(_) | Value::Number(_) => Ok(Value::Undefined),
        }
    }

    fn get_from(&self, handle: ObjectRef, key: &str) -> Value {
        let mut current = Some(handle);
        while let Some(handle) = current {
            let object = self.object(handle);
            if let Some(prop) = object.get_own(key) {
                return prop.value.clone();
            }
            current = object.prototype;
        }
        Value::Undefined
    }

    /// Property write. Arrays keep `length` in step with their indices.
    pub fn put(&mut self, base: &Value, key: &str, value: Value, strict: bool) -> Result<(), Throw> {
        let handle = match base {
            Value::Undefined | Value::Null => {
                return Err(Throw::type_error(format!(
                    "cannot set property '{}' of {}",
                    key, base
                )));
            }
            Value::Object(handle) => *handle,
            _ if strict => {
                return Err(Throw::type_error(format!(
                    "cannot create property '{}' on primitive {}",
                    key, base
                )));
            }
            _ => return Ok(()),
        };

        if self.object(handle).is_array() {
            if key == "length" {
                return self.set_array_length(handle, &value);
            }
            if let Some(index) = array_index(key) {
                let object = self.object_mut(handle);
                if index >= object.array_length() {
                    object.define(
                        "length",
                        Property::hidden(Value::Number(index as f64 + 1.0)),
                    );
                }
            }
        }

        if !self.object_mut(handle).set(key, value) && strict {
            return Err(Throw::type_error(format!(
                "cannot assign to read only property '{}'",
                key
            )));
        }
        Ok(())
    }

    fn set_array_length(&mut self, handle: ObjectRef, value: &Value) -> Result<(), Throw> {
        let requested = self.to_number(value);
        let length = requested as u32;
        if length as f64 != requested {
            return Err(Throw::range_error("invalid array length"));
        }
        let object = self.object_mut(handle);
        object.truncate(length);
        object.define("length", Property::hidden(Value::Number(length as f64)));
        Ok(())
    }

    /// Own property deletion.
    pub fn delete(&mut self, base: &Value, key: &str, strict: bool) -> Result<bool, Throw> {
        match base {
            Value::Undefined | Value::Null => Err(Throw::type_error(format!(
                "cannot delete property '{}' of {}",
                key, base
            ))),
            Value::Object(handle) => {
                let deleted = self.object_mut(*handle).delete(key);
                if !deleted && strict {
                    return Err(Throw::type_error(format!(
                        "cannot delete property '{}'",
                        key
                    )));
                }
                Ok(deleted)
            }
            _ => Ok(true),
        }
    }

    /// Property presence with prototype lookup.
    pub fn has_property(&self, handle: ObjectRef, key: &str) -> bool {
        let mut current = Some(handle);
        while let Some(handle) = current {
            let object = self.object(handle);
            if object.has_own(key) {
                return true;
            }
            current = object.prototype;
        }
        false
    }

    /// The for-in key sequence: enumerable own keys, then inherited ones
    /// not shadowed by anything already seen.
    pub fn enumerate_keys(&self, value: &Value) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        let mut current = value.as_object();
        while let Some(handle) = current {
            let object = self.object(handle);
            for key in object.enumerable_keys() {
                if !seen.contains(&key) {
                    keys.push(key.to_string());
                }
            }
            // Non-enumerable own keys still shadow inherited ones.
            seen.extend(object.own_keys());
            current = object.prototype;
        }
        keys
    }

    // ========================================================================
    // Bindings
    // ========================================================================

    /// Finds the environment that binds `name`, searching outward.
    pub fn resolve(&self, env: EnvRef, name: &str) -> Option<EnvRef> {
        let mut current = Some(env);
        while let Some(handle) = current {
            let environment = self.env(handle);
            if environment.has(name) {
                return Some(handle);
            }
            current = environment.outer();
        }
        None
    }

    pub fn lookup(&self, env: EnvRef, name: &str) -> Option<Value> {
        self.resolve(env, name)
            .and_then(|handle| self.env(handle).get(name).cloned())
    }

    /// Assignment to a name. Unresolvable names become deletable globals in
    /// sloppy code and a ReferenceError in strict code.
    pub fn assign(&mut self, env: EnvRef, name: &str, value: Value, strict: bool) -> Result<(), Throw> {
        match self.resolve(env, name) {
            Some(handle) => {
                self.env_mut(handle).set(name, value);
                Ok(())
            }
            None if strict => Err(Throw::reference_error(format!("{} is not defined", name))),
            None => {
                let global = self.env_mut(self.global_env);
                global.declare(name, true);
                global.set(name, value);
                Ok(())
            }
        }
    }

    /// `delete name`. Unresolvable names report true.
    pub fn delete_binding(&mut self, env: EnvRef, name: &str) -> bool {
        match self.resolve(env, name) {
            Some(handle) => self.env_mut(handle).delete(name),
            None => true,
        }
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    pub fn is_callable(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|handle| self.object(handle).closure().is_some())
    }

    pub fn type_of(&self, value: &Value) -> &'static str {
        match value {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) if self.is_callable(value) => "function",
            Value::Object(_) => "object",
        }
    }

    /// ToPrimitive. Objects become their string form.
    pub fn to_primitive(&self, value: &Value) -> Value {
        match value {
            Value::Object(_) => Value::String(self.to_js_string(value)),
            other => other.clone(),
        }
    }

    /// ToNumber, including objects.
    pub fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Object(_) => string_to_number(&self.to_js_string(value)),
            other => other.to_number(),
        }
    }

    /// ToString, including objects.
    pub fn to_js_string(&self, value: &Value) -> String {
        let mut visiting = Vec::new();
        self.stringify(value, &mut visiting)
    }

    fn stringify(&self, value: &Value, visiting: &mut Vec<ObjectRef>) -> String {
        let handle = match value {
            Value::Object(handle) => *handle,
            Value::Number(n) => return number_to_string(*n),
            other => return other.to_string(),
        };
        let object = self.object(handle);
        match &object.kind {
            ObjectKind::Array => {
                if visiting.contains(&handle) {
                    return String::new();
                }
                visiting.push(handle);
                let parts: Vec<String> = (0..object.array_length())
                    .map(|index| match self.get_from(handle, &index.to_string()) {
                        Value::Undefined | Value::Null => String::new(),
                        element => self.stringify(&element, visiting),
                    })
                    .collect();
                visiting.pop();
                parts.join(",")
            }
            ObjectKind::Function(closure) => format!(
                "function {}() {{ [compiled code] }}",
                closure.name().unwrap_or_default()
            ),
            ObjectKind::Error => {
                let name = self.stringify(&self.get_from(handle, "name"), visiting);
                let message = self.stringify(&self.get_from(handle, "message"), visiting);
                if message.is_empty() {
                    name
                } else {
                    format!("{}: {}", name, message)
                }
            }
            ObjectKind::RegExp { pattern, flags } => format!("/{}/{}", pattern, flags),
            ObjectKind::Ordinary => "[object Object]".to_string(),
        }
    }

    /// `value instanceof constructor`.
    pub fn instance_of(&self, value: &Value, constructor: &Value) -> Result<bool, Throw> {
        if !self.is_callable(constructor) {
            return Err(Throw::type_error(
                "right-hand side of 'instanceof' is not callable",
            ));
        }
        let Some(target) = self.get(constructor, "prototype")?.as_object() else {
            return Err(Throw::type_error(
                "function has non-object prototype in instanceof check",
            ));
        };
        let mut current = value.as_object().and_then(|h| self.object(h).prototype);
        while let Some(handle) = current {
            if handle == target {
                return Ok(true);
            }
            current = self.object(handle).prototype;
        }
        Ok(false)
    }

    // ========================================================================
    // Host output and call bookkeeping
    // ========================================================================

    pub fn print(&mut self, line: String) {
        self.output.push(line);
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Enters a function call, failing with a RangeError past the limit.
    pub fn enter_call(&mut self) -> Result<(), Throw> {
        if self.call_depth >= self.max_call_depth {
            warn!(depth = self.call_depth, "call depth limit reached");
            return Err(Throw::range_error("maximum call stack size exceeded"));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    pub fn record_invocation(&mut self, unit: &str) {
        if self.trace_units {
            *self.unit_invocations.entry(unit.to_string()).or_insert(0) += 1;
        }
    }

    /// How many times a unit ran, when unit tracing is on.
    pub fn unit_invocations(&self, unit: &str) -> usize {
        self.unit_invocations.get(unit).copied().unwrap_or(0)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}
