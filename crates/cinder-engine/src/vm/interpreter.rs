// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The unit interpreter.
//!
//! Every unit invocation gets its own operand stack and temporary area and
//! runs against the caller's [`ExecutionContext`]. A runtime fault inside a
//! unit ends that unit with a THROW completion; the surrounding code sees it
//! like any other abrupt completion.
//!
//! Nested units and function calls live on an explicit frame stack rather
//! than the native one, so nesting depth is bounded only by the realm's call
//! depth limit.

use std::sync::Arc;

use tracing::trace;

use super::VmError;
use super::helpers;
use crate::compiler::{
    Artifact, CompiledUnit, Completion, CompletionKind, Helper, Instruction, Label, OperandIndex,
    UnitId,
};
use crate::runtime::{Closure, EnvRef, ExecutionContext, Realm, Throw, Value};

/// Why a frame stopped early.
#[derive(Debug)]
enum Interrupt {
    /// A runtime fault or uncaught script throw
    Throw(Throw),
    /// Malformed code; aborts the whole run
    Fatal(VmError),
}

impl From<Throw> for Interrupt {
    fn from(throw: Throw) -> Self {
        Interrupt::Throw(throw)
    }
}

impl From<VmError> for Interrupt {
    fn from(error: VmError) -> Self {
        Interrupt::Fatal(error)
    }
}

/// An operand stack entry.
#[derive(Debug, Clone)]
enum Slot {
    Value(Value),
    Completion(Completion),
}

/// What the caller receives once a frame finishes.
#[derive(Debug)]
enum Resume {
    /// `InvokeUnit`: the completion itself
    Unit,
    /// A function call: the returned value. The caller's `this` and
    /// strictness are restored first.
    Call {
        this: Value,
        strict: bool,
        /// For `new`, the object that replaces a non-object result
        construct: Option<Value>,
    },
}

/// Why `run_frame` handed control back.
enum Exit {
    /// The unit ran off its last instruction
    Done,
    /// A nested unit or function body must run first
    Enter(Frame),
}

/// Per-invocation state of one unit.
struct Frame {
    artifact: Arc<Artifact>,
    unit: usize,
    stack: Vec<Slot>,
    temps: Vec<Value>,
    /// Environments to restore when catch scopes close
    scopes: Vec<EnvRef>,
    ip: usize,
    /// The caller's environment, restored when this frame finishes
    caller_env: EnvRef,
    resume: Resume,
}

impl Frame {
    fn new(
        artifact: Arc<Artifact>,
        id: UnitId,
        caller_env: EnvRef,
        resume: Resume,
    ) -> Result<Self, VmError> {
        let unit = artifact.unit(id).ok_or(VmError::MissingUnit(id.index()))?;
        let temps = vec![Value::Undefined; unit.temp_count as usize];
        Ok(Self {
            artifact,
            unit: id.index(),
            stack: Vec::with_capacity(16),
            temps,
            scopes: Vec::new(),
            ip: 0,
            caller_env,
            resume,
        })
    }

    /// The unit this frame runs. The index was checked in [`Frame::new`].
    fn unit(&self) -> &CompiledUnit {
        &self.artifact.units[self.unit]
    }

    fn underflow(&self) -> VmError {
        VmError::StackUnderflow {
            unit: self.unit().name.clone(),
            ip: self.ip.saturating_sub(1),
        }
    }

    fn mismatch(&self, expected: &'static str) -> VmError {
        VmError::SlotMismatch {
            unit: self.unit().name.clone(),
            ip: self.ip.saturating_sub(1),
            expected,
        }
    }

    fn missing_temp(&self, index: u16) -> VmError {
        VmError::MissingTemporary {
            unit: self.unit().name.clone(),
            index,
        }
    }

    fn push(&mut self, value: Value) {
        self.stack.push(Slot::Value(value));
    }

    fn push_completion(&mut self, completion: Completion) {
        self.stack.push(Slot::Completion(completion));
    }

    fn pop_slot(&mut self) -> Result<Slot, VmError> {
        self.stack.pop().ok_or_else(|| self.underflow())
    }

    fn pop(&mut self) -> Result<Value, VmError> {
        match self.pop_slot()? {
            Slot::Value(value) => Ok(value),
            Slot::Completion(_) => Err(self.mismatch("value")),
        }
    }

    fn pop_completion(&mut self) -> Result<Completion, VmError> {
        match self.pop_slot()? {
            Slot::Completion(completion) => Ok(completion),
            Slot::Value(_) => Err(self.mismatch("completion")),
        }
    }

    fn peek(&self) -> Result<&Value, VmError> {
        match self.stack.last() {
            Some(Slot::Value(value)) => Ok(value),
            Some(Slot::Completion(_)) => Err(self.mismatch("value")),
            None => Err(self.underflow()),
        }
    }

    fn peek_completion(&self) -> Result<&Completion, VmError> {
        match self.stack.last() {
            Some(Slot::Completion(completion)) => Ok(completion),
            Some(Slot::Value(_)) => Err(self.mismatch("completion")),
            None => Err(self.underflow()),
        }
    }

    /// Pops `count` values, returned in push order.
    fn pop_values(&mut self, count: usize) -> Result<Vec<Value>, VmError> {
        if self.stack.len() < count {
            return Err(self.underflow());
        }
        let slots = self.stack.split_off(self.stack.len() - count);
        slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Value(value) => Ok(value),
                Slot::Completion(_) => Err(self.mismatch("value")),
            })
            .collect()
    }

    fn jump(&mut self, label: Label) -> Result<(), VmError> {
        match self.unit().label_offset(label) {
            Some(offset) => {
                self.ip = offset;
                Ok(())
            }
            None => Err(VmError::MissingLabel {
                unit: self.unit().name.clone(),
                label: label.index(),
            }),
        }
    }

    fn temp(&self, index: u16) -> Result<&Value, VmError> {
        self.temps
            .get(index as usize)
            .ok_or_else(|| self.missing_temp(index))
    }

    fn set_temp(&mut self, index: u16, value: Value) -> Result<(), VmError> {
        if index as usize >= self.temps.len() {
            return Err(self.missing_temp(index));
        }
        self.temps[index as usize] = value;
        Ok(())
    }

    /// A finished unit must leave exactly one completion.
    fn finish(&mut self) -> Result<Completion, VmError> {
        let depth = self.stack.len();
        match self.stack.pop() {
            Some(Slot::Completion(completion)) if depth == 1 => Ok(completion),
            _ => Err(VmError::UnbalancedUnit {
                unit: self.unit().name.clone(),
                depth,
            }),
        }
    }
}

/// Resolves a variable operand of `unit`.
fn variable(unit: &CompiledUnit, index: OperandIndex) -> Result<&str, VmError> {
    let operand = unit.operand(index).ok_or_else(|| VmError::MissingOperand {
        unit: unit.name.clone(),
        index: index.index(),
    })?;
    operand
        .as_variable()
        .map(|variable| variable.name.as_str())
        .ok_or_else(|| VmError::NotAVariable {
            unit: unit.name.clone(),
            index: index.index(),
        })
}

/// Runs the units of one artifact.
pub struct Interpreter<'a> {
    artifact: &'a Arc<Artifact>,
}

impl<'a> Interpreter<'a> {
    pub fn new(artifact: &'a Arc<Artifact>) -> Self {
        Self { artifact }
    }

    /// Runs the artifact's entry unit.
    pub fn run(&self, cx: &mut ExecutionContext<'_>) -> Result<Completion, VmError> {
        self.invoke_unit(self.artifact.entry, cx)
    }

    /// Runs one unit, and everything it invokes, to its completion.
    ///
    /// The context's environment is restored afterwards, so catch scopes
    /// opened inside the unit never leak out of it. After a fatal error the
    /// whole context, call depth included, is put back as it was.
    pub fn invoke_unit(
        &self,
        id: UnitId,
        cx: &mut ExecutionContext<'_>,
    ) -> Result<Completion, VmError> {
        let env = cx.env;
        let this = cx.this_binding.clone();
        let strict = cx.strict;
        let depth = cx.realm.call_depth();

        let root = Frame::new(Arc::clone(self.artifact), id, env, Resume::Unit)?;
        let result = drive(root, cx);
        if result.is_err() {
            cx.env = env;
            cx.this_binding = this;
            cx.strict = strict;
            while cx.realm.call_depth() > depth {
                cx.realm.exit_call();
            }
        }
        result
    }
}

fn enter(frame: &Frame, cx: &mut ExecutionContext<'_>) {
    let name = &frame.unit().name;
    cx.realm.record_invocation(name);
    trace!(unit = %name, "invoke");
}

/// Runs frames until `root` finishes.
fn drive(mut root: Frame, cx: &mut ExecutionContext<'_>) -> Result<Completion, VmError> {
    let mut nested: Vec<Frame> = Vec::new();
    // A fault raised in the top frame while resuming it after a call
    let mut fault: Option<Throw> = None;
    enter(&root, cx);

    loop {
        let frame = nested.last_mut().unwrap_or(&mut root);
        let exit = match fault.take() {
            Some(throw) => Err(Interrupt::Throw(throw)),
            None => run_frame(frame, cx),
        };
        let completion = match exit {
            Ok(Exit::Enter(callee)) => {
                enter(&callee, cx);
                nested.push(callee);
                continue;
            }
            Ok(Exit::Done) => frame.finish()?,
            Err(Interrupt::Throw(throw)) => {
                trace!(unit = %frame.unit().name, %throw, "unit threw");
                Completion::throw(cx.realm.materialize(throw))
            }
            Err(Interrupt::Fatal(error)) => return Err(error),
        };
        cx.env = frame.caller_env;

        let Some(done) = nested.pop() else {
            return Ok(completion);
        };
        let caller = nested.last_mut().unwrap_or(&mut root);
        match done.resume {
            Resume::Unit => caller.push_completion(completion),
            Resume::Call {
                this,
                strict,
                construct,
            } => {
                cx.this_binding = this;
                cx.strict = strict;
                cx.realm.exit_call();
                match call_result(completion, &done.artifact.units[done.unit], construct) {
                    Ok(value) => caller.push(value),
                    Err(Interrupt::Throw(throw)) => fault = Some(throw),
                    Err(Interrupt::Fatal(error)) => return Err(error),
                }
            }
        }
    }
}

/// Maps a function body's completion to the call's result.
fn call_result(
    completion: Completion,
    unit: &CompiledUnit,
    construct: Option<Value>,
) -> Result<Value, Interrupt> {
    let value = match completion.kind {
        CompletionKind::Return => completion.value_or_undefined(),
        CompletionKind::Normal => Value::Undefined,
        CompletionKind::Throw => {
            return Err(Interrupt::Throw(Throw::Value(completion.value_or_undefined())));
        }
        kind @ (CompletionKind::Break | CompletionKind::Continue) => {
            return Err(VmError::EscapedCompletion {
                kind,
                unit: unit.name.clone(),
            }
            .into());
        }
    };
    Ok(match construct {
        Some(object) if value.as_object().is_none() => object,
        _ => value,
    })
}

/// Runs `frame` until it finishes or needs a nested frame.
fn run_frame(frame: &mut Frame, cx: &mut ExecutionContext<'_>) -> Result<Exit, Interrupt> {
    let artifact = Arc::clone(&frame.artifact);
    let unit = &artifact.units[frame.unit];
    while let Some(instruction) = unit.instructions.get(frame.ip) {
        frame.ip += 1;

        match instruction {
            // ================================================================
            // Operands and bindings
            // ================================================================
            Instruction::Load(index) => {
                let operand = unit.operand(*index).ok_or_else(|| VmError::MissingOperand {
                    unit: unit.name.clone(),
                    index: index.index(),
                })?;
                let value = operand.retrieve(cx, &frame.temps)?;
                frame.push(value);
            }
            Instruction::Store { variable: index, strict } => {
                let name = variable(unit, *index)?;
                let value = frame.peek()?.clone();
                cx.realm.assign(cx.env, name, value, *strict)?;
            }
            Instruction::StoreTemp(temp) => {
                let value = frame.pop()?;
                frame.set_temp(temp.index, value)?;
            }
            Instruction::LoadThis => frame.push(cx.this_binding.clone()),
            Instruction::TypeOfVariable(index) => {
                let name = variable(unit, *index)?;
                let kind = match cx.realm.lookup(cx.env, name) {
                    Some(value) => cx.realm.type_of(&value),
                    None => "undefined",
                };
                frame.push(Value::from(kind));
            }
            Instruction::DeleteVariable(index) => {
                let name = variable(unit, *index)?;
                let deleted = cx.realm.delete_binding(cx.env, name);
                frame.push(Value::Boolean(deleted));
            }
            Instruction::DeclareVariable(index) => {
                let name = variable(unit, *index)?;
                cx.realm.env_mut(cx.env).declare(name, false);
            }
            Instruction::InitializeBinding(index) => {
                let name = variable(unit, *index)?;
                let value = frame.pop()?;
                cx.realm.env_mut(cx.env).initialize(name, value);
            }
            Instruction::MakeClosure(id) => {
                let info = artifact
                    .function(*id)
                    .ok_or(VmError::MissingFunction(id.index()))?;
                let env = if info.self_binding {
                    cx.realm.new_env(Some(cx.env))
                } else {
                    cx.env
                };
                let closure = Closure::new(Arc::clone(&artifact), *id, env);
                let function = Value::Object(cx.realm.new_function(closure));
                if let (true, Some(name)) = (info.self_binding, info.name.as_deref()) {
                    cx.realm.env_mut(env).initialize(name, function.clone());
                }
                frame.push(function);
            }

            // ================================================================
            // Stack shuffling
            // ================================================================
            Instruction::Pop => {
                frame.pop_slot()?;
            }
            Instruction::Dup => {
                let top = frame.stack.last().cloned().ok_or_else(|| frame.underflow())?;
                frame.stack.push(top);
            }
            Instruction::Dup2 => {
                let len = frame.stack.len();
                if len < 2 {
                    return Err(frame.underflow().into());
                }
                let pair = frame.stack[len - 2..].to_vec();
                frame.stack.extend(pair);
            }
            Instruction::Swap => {
                let len = frame.stack.len();
                if len < 2 {
                    return Err(frame.underflow().into());
                }
                frame.stack.swap(len - 1, len - 2);
            }
            Instruction::Nop => {}

            // ================================================================
            // Control flow
            // ================================================================
            Instruction::Jump(label) => frame.jump(*label)?,
            Instruction::JumpIfFalse(label) => {
                if !frame.pop()?.to_boolean() {
                    frame.jump(*label)?;
                }
            }
            Instruction::JumpIfTrue(label) => {
                if frame.pop()?.to_boolean() {
                    frame.jump(*label)?;
                }
            }
            Instruction::InvokeUnit(id) => {
                let callee = Frame::new(Arc::clone(&artifact), *id, cx.env, Resume::Unit)?;
                return Ok(Exit::Enter(callee));
            }
            Instruction::CallHelper(helper) => {
                if let Some(callee) = call_helper(frame, *helper, cx)? {
                    return Ok(Exit::Enter(callee));
                }
            }
            Instruction::EnterCatchScope(index) => {
                let name = variable(unit, *index)?;
                let value = frame.pop()?;
                let scope = cx.realm.new_env(Some(cx.env));
                cx.realm.env_mut(scope).initialize(name, value);
                frame.scopes.push(cx.env);
                cx.env = scope;
            }
            Instruction::ExitScope => {
                cx.env = frame.scopes.pop().ok_or_else(|| VmError::ScopeUnderflow {
                    unit: unit.name.clone(),
                })?;
            }
            Instruction::ForInStep { keys, exhausted } => match next_key(frame, keys.index, cx)? {
                Some(key) => frame.push(Value::String(key)),
                None => frame.jump(*exhausted)?,
            },

            // ================================================================
            // Completion records
            // ================================================================
            Instruction::NormalCompletion => frame.push_completion(Completion::normal()),
            Instruction::ValueCompletion => {
                let value = frame.pop()?;
                frame.push_completion(Completion::normal_with(value));
            }
            Instruction::BreakCompletion(target) => {
                frame.push_completion(Completion::break_to(target.clone()));
            }
            Instruction::ContinueCompletion(target) => {
                frame.push_completion(Completion::continue_to(target.clone()));
            }
            Instruction::ReturnCompletion => {
                let value = frame.pop()?;
                frame.push_completion(Completion::return_with(value));
            }
            Instruction::ThrowCompletion => {
                let value = frame.pop()?;
                frame.push_completion(Completion::throw(value));
            }
            Instruction::JumpIfAbrupt(label) => {
                if frame.peek_completion()?.is_abrupt() {
                    frame.jump(*label)?;
                }
            }
            Instruction::JumpIfKind(kind, label) => {
                if frame.peek_completion()?.kind == *kind {
                    frame.jump(*label)?;
                }
            }
            Instruction::JumpIfNotKind(kind, label) => {
                if frame.peek_completion()?.kind != *kind {
                    frame.jump(*label)?;
                }
            }
            Instruction::JumpIfBreaksHere { labels, target } => {
                let completion = frame.peek_completion()?;
                if completion.kind == CompletionKind::Break
                    && labels.handles(completion.target.as_deref())
                {
                    frame.jump(*target)?;
                }
            }
            Instruction::JumpIfContinuesHere { labels, target } => {
                let completion = frame.peek_completion()?;
                if completion.kind == CompletionKind::Continue
                    && labels.handles(completion.target.as_deref())
                {
                    frame.jump(*target)?;
                }
            }
            Instruction::MergeCompletion => {
                let completion = frame.pop_completion()?;
                let accumulated = frame.pop_completion()?;
                frame.push_completion(Completion {
                    value: completion.value.or(accumulated.value),
                    ..Completion::normal()
                });
            }
            Instruction::ConsumeBreak(labels) => {
                let completion = frame.pop_completion()?;
                let consumed = completion.kind == CompletionKind::Break
                    && completion
                        .target
                        .as_deref()
                        .is_some_and(|target| labels.contains(target));
                if consumed {
                    frame.push_completion(Completion {
                        value: completion.value,
                        ..Completion::normal()
                    });
                } else {
                    frame.push_completion(completion);
                }
            }
            Instruction::UnwrapCompletion => {
                let completion = frame.pop_completion()?;
                frame.push(completion.value_or_undefined());
            }
        }
    }
    Ok(Exit::Done)
}

/// Applies a helper. Calls and `new` return the callee's frame instead of a
/// value; its result is pushed when that frame finishes.
fn call_helper(
    frame: &mut Frame,
    helper: Helper,
    cx: &mut ExecutionContext<'_>,
) -> Result<Option<Frame>, Interrupt> {
    let args = frame.pop_values(helper.arity())?;
    match helper {
        Helper::Call { .. } => {
            let mut args = args.into_iter();
            let this = args.next().unwrap_or_default();
            let callee = args.next().unwrap_or_default();
            enter_function(cx, &callee, this, args.collect(), None).map(Some)
        }
        Helper::Construct { .. } => {
            let mut args = args.into_iter();
            let callee = args.next().unwrap_or_default();
            construct(cx, &callee, args.collect()).map(Some)
        }
        _ => {
            let result = helpers::apply(cx.realm, helper, args)?;
            frame.push(result);
            Ok(None)
        }
    }
}

/// Advances a for-in cursor past keys deleted since enumeration began.
fn next_key(
    frame: &mut Frame,
    keys: u16,
    cx: &mut ExecutionContext<'_>,
) -> Result<Option<String>, Interrupt> {
    let list = frame.temp(keys)?.clone();
    let object = frame.temp(keys + 2)?.clone();
    let mut cursor = cx.realm.to_number(frame.temp(keys + 1)?) as u32;
    let length = list
        .as_object()
        .map(|handle| cx.realm.object(handle).array_length())
        .unwrap_or(0);

    let mut next = None;
    while cursor < length {
        let key = cx.realm.get(&list, &cursor.to_string())?;
        cursor += 1;
        let key = cx.realm.to_js_string(&key);
        let present = object
            .as_object()
            .is_none_or(|handle| cx.realm.has_property(handle, &key));
        if present {
            next = Some(key);
            break;
        }
    }
    frame.set_temp(keys + 1, Value::Number(cursor as f64))?;
    Ok(next)
}

/// Sets up a call to a function object and returns the frame for its body.
///
/// The context switches to the callee's environment, `this` and strictness;
/// the caller's are kept in the frame and restored when it finishes.
fn enter_function(
    cx: &mut ExecutionContext<'_>,
    callee: &Value,
    this: Value,
    args: Vec<Value>,
    construct: Option<Value>,
) -> Result<Frame, Interrupt> {
    let closure = callee
        .as_object()
        .and_then(|handle| cx.realm.object(handle).closure().cloned())
        .ok_or_else(|| {
            Throw::type_error(format!("{} is not a function", cx.realm.to_js_string(callee)))
        })?;
    let info = closure.info();

    let resume = Resume::Call {
        this: cx.this_binding.clone(),
        strict: cx.strict,
        construct,
    };
    let frame = Frame::new(Arc::clone(&closure.artifact), info.unit, cx.env, resume)?;
    cx.realm.enter_call()?;

    let env = cx.realm.new_env(Some(closure.env));
    let arguments = Value::Object(cx.realm.new_array(args.clone()));
    cx.realm.env_mut(env).initialize("arguments", arguments);
    let mut args = args.into_iter();
    for param in &info.params {
        let value = args.next().unwrap_or_default();
        cx.realm.env_mut(env).initialize(param, value);
    }

    cx.this_binding = if !info.strict && this.is_nullish() {
        Value::Object(cx.realm.global_object())
    } else {
        this
    };
    cx.env = env;
    cx.strict = info.strict;
    Ok(frame)
}

/// `new F(args)`: a fresh object inheriting from `F.prototype`, replaced by
/// the call's result when that is an object.
fn construct(
    cx: &mut ExecutionContext<'_>,
    callee: &Value,
    args: Vec<Value>,
) -> Result<Frame, Interrupt> {
    if !cx.realm.is_callable(callee) {
        return Err(Throw::type_error(format!(
            "{} is not a constructor",
            cx.realm.to_js_string(callee)
        ))
        .into());
    }
    let prototype = cx.realm.get(callee, "prototype")?;
    let object = Value::Object(cx.realm.new_object_with_prototype(&prototype));
    enter_function(cx, callee, object.clone(), args, Some(object))
}

/// Runs a compiled program's entry unit in the global context.
pub fn run_program(
    artifact: &Arc<Artifact>,
    realm: &mut Realm,
    strict: bool,
) -> Result<Completion, VmError> {
    let mut cx = ExecutionContext::global(realm, strict);
    Interpreter::new(artifact).run(&mut cx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::emitter::Emitter;
    use crate::compiler::{LabelSet, Role};
    use crate::ir::{Constant, Operand};

    fn artifact(units: Vec<CompiledUnit>) -> Arc<Artifact> {
        Arc::new(Artifact {
            entry: UnitId(0),
            units,
            functions: vec![],
        })
    }

    fn run(artifact: &Arc<Artifact>) -> (Result<Completion, VmError>, Realm) {
        let mut realm = Realm::with_limits(16, true);
        let result = run_program(artifact, &mut realm, false);
        (result, realm)
    }

    #[test]
    fn test_value_completion() {
        let mut emitter = Emitter::new("Program_0");
        emitter.load_constant(Constant::Number(7.0)).unwrap();
        emitter.value_completion();
        let artifact = artifact(vec![emitter.finish(Role::Program, false).unwrap()]);

        let (result, _) = run(&artifact);
        assert_eq!(result.unwrap(), Completion::normal_with(Value::Number(7.0)));
    }

    #[test]
    fn test_unit_leaving_a_value_is_unbalanced() {
        let mut emitter = Emitter::new("Program_0");
        emitter.load_constant(Constant::Null).unwrap();
        let artifact = artifact(vec![emitter.finish(Role::Program, false).unwrap()]);

        let (result, _) = run(&artifact);
        assert!(matches!(result, Err(VmError::UnbalancedUnit { depth: 1, .. })));
    }

    #[test]
    fn test_fault_becomes_throw_completion() {
        let mut emitter = Emitter::new("Program_0");
        emitter.load(Operand::variable("missing")).unwrap();
        emitter.value_completion();
        let artifact = artifact(vec![emitter.finish(Role::Program, false).unwrap()]);

        let (result, realm) = run(&artifact);
        let completion = result.unwrap();
        assert_eq!(completion.kind, CompletionKind::Throw);
        let error = completion.value_or_undefined();
        assert_eq!(
            realm.to_js_string(&error),
            "ReferenceError: missing is not defined"
        );
    }

    #[test]
    fn test_temporaries_are_per_invocation() {
        // Body_0 reads its temporary before writing it; every invocation
        // must see undefined.
        let mut body = Emitter::new("Body_0");
        let temp = body.allocate_temp().unwrap();
        body.load_temp(temp).unwrap();
        body.value_completion();
        body.load_constant(Constant::Number(1.0)).unwrap();
        body.store_temp(temp);
        let body = body.finish(Role::Body, false).unwrap();

        let mut program = Emitter::new("Program_0");
        program.invoke_unit(UnitId(1));
        program.invoke_unit(UnitId(1));
        program.merge_completion();
        let program = program.finish(Role::Program, false).unwrap();

        let artifact = artifact(vec![program, body]);
        let (result, realm) = run(&artifact);
        assert_eq!(result.unwrap(), Completion::normal_with(Value::Undefined));
        assert_eq!(realm.unit_invocations("Body_0"), 2);
    }

    #[test]
    fn test_consume_break_only_for_named_targets() {
        let mut emitter = Emitter::new("Program_0");
        emitter.break_completion(None);
        emitter.consume_break(LabelSet::single("outer"));
        let artifact = artifact(vec![emitter.finish(Role::Program, false).unwrap()]);
        let (result, _) = run(&artifact);
        assert_eq!(result.unwrap().kind, CompletionKind::Break);

        let mut emitter = Emitter::new("Program_0");
        emitter.break_completion(Some("outer".into()));
        emitter.consume_break(LabelSet::single("outer"));
        let artifact = self::artifact(vec![emitter.finish(Role::Program, false).unwrap()]);
        let (result, _) = run(&artifact);
        assert_eq!(result.unwrap(), Completion::normal());
    }

    #[test]
    fn test_merge_keeps_previous_value() {
        let mut emitter = Emitter::new("Program_0");
        emitter.load_constant(Constant::Number(1.0)).unwrap();
        emitter.value_completion();
        emitter.normal_completion();
        emitter.merge_completion();
        let artifact = artifact(vec![emitter.finish(Role::Program, false).unwrap()]);
        let (result, _) = run(&artifact);
        assert_eq!(result.unwrap(), Completion::normal_with(Value::Number(1.0)));
    }

    #[test]
    fn test_slot_mismatch_is_fatal() {
        let unit = CompiledUnit {
            name: "Program_0".into(),
            role: Role::Program,
            strict: false,
            instructions: vec![Instruction::NormalCompletion, Instruction::JumpIfFalse(Label(0))],
            operands: vec![],
            labels: vec![0],
            temp_count: 0,
        };
        let (result, _) = run(&artifact(vec![unit]));
        assert!(matches!(
            result,
            Err(VmError::SlotMismatch { expected: "value", .. })
        ));
    }
}
