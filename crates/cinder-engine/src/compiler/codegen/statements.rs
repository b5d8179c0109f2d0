// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Statement lowering.
//!
//! Every statement leaves exactly one completion record on the stack.
//! Bodies owned by control constructs are compiled into their own units and
//! invoked; the construct then dispatches on the completion they return.
//!
//! | Statement | Units | Key instructions |
//! |-----------|-------|------------------|
//! | expression | | `ValueCompletion` |
//! | `var` | | `Store`, `Pop` |
//! | `if/else` | `Then_N`, `Else_N` | `JumpIfFalse`, `InvokeUnit` |
//! | `while`, `do-while`, `for` | `Body_N` | `JumpIfBreaksHere`, `JumpIfContinuesHere` |
//! | `for-in` | `Body_N` | `EnumerateKeys`, `ForInStep` |
//! | `switch` | `Case_N`, `Default_N` | `StrictEqual`, `JumpIfBreaksHere` |
//! | `try/catch/finally` | `Body_N`, `Catch_N`, `Finally_N` | `JumpIfNotKind`, `EnterCatchScope` |
//! | `return`, `throw` | | `ReturnCompletion`, `ThrowCompletion` |
//! | `break`, `continue` | | `BreakCompletion`, `ContinueCompletion` |
//! | labeled | | `ConsumeBreak` |
//!
//! ## Loop iteration
//!
//! All loops share one dispatch on the body's completion. `acc` is the
//! loop's running NORMAL completion.
//!
//! ```text
//!   InvokeUnit Body_N           ; acc c
//!   JumpIfBreaksHere -> brk
//!   JumpIfContinuesHere -> cont
//!   JumpIfAbrupt -> abrupt
//! cont:
//!   MergeCompletion; Jump -> next
//! brk:
//!   MergeCompletion; Jump -> done
//! abrupt:
//!   Swap; Pop; Jump -> done     ; c propagates
//! ```
//!
//! ## Try statement
//!
//! ```text
//!   InvokeUnit Body_N                      ; c
//!   JumpIfNotKind THROW -> after_catch
//!   UnwrapCompletion                       ; exception
//!   EnterCatchScope e
//!   InvokeUnit Catch_N                     ; c
//!   ExitScope
//! after_catch:
//!   InvokeUnit Finally_N                   ; c f
//!   JumpIfAbrupt -> override
//!   Pop; Jump -> end                       ; c
//! override:
//!   Swap; Pop                              ; f
//! end:
//! ```

use super::{CodeGenerator, UnitContext};
use crate::ast::*;
use crate::compiler::block_manager::Body;
use crate::compiler::bytecode::{Instruction, Label, Role};
use crate::compiler::completion::{CompletionKind, LabelSet};
use crate::compiler::error::CompileError;
use crate::compiler::helpers::Helper;
use crate::ir::{Constant, Temporary};

impl CodeGenerator<'_> {
    /// Invokes a loop body and routes its completion. See the module docs.
    fn iteration(
        &mut self,
        cx: &mut UnitContext,
        labels: &LabelSet,
        body: &Statement,
        next: Label,
        done: Label,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.invoke_body(cx, Role::Body, Body::Statement(body), strict)?;

        let brk = cx.emitter.new_label();
        let cont = cx.emitter.new_label();
        let abrupt = cx.emitter.new_label();
        cx.emitter.jump_if_breaks_here(labels, brk);
        cx.emitter.jump_if_continues_here(labels, cont);
        cx.emitter.jump_if_abrupt(abrupt);

        cx.emitter.place_label(cont)?;
        cx.emitter.merge_completion();
        cx.emitter.jump(next);

        cx.emitter.place_label(brk)?;
        cx.emitter.merge_completion();
        cx.emitter.jump(done);

        cx.emitter.place_label(abrupt)?;
        cx.emitter.swap();
        cx.emitter.pop();
        cx.emitter.jump(done);
        Ok(())
    }

    /// Evaluates `var` initializers in place; the names are already bound.
    fn variable_initializers(
        &mut self,
        cx: &mut UnitContext,
        declaration: &VariableDeclaration,
        strict: bool,
    ) -> Result<(), CompileError> {
        for declarator in &declaration.declarations {
            if let Some(init) = &declarator.init {
                self.expression(cx, init, strict)?;
                let variable = cx.emitter.variable(&declarator.id.name)?;
                cx.emitter.emit(Instruction::Store { variable, strict });
                cx.emitter.pop();
            }
        }
        Ok(())
    }

    fn switch_body(
        &mut self,
        cx: &mut UnitContext,
        case: &SwitchCase,
        strict: bool,
    ) -> Result<(), CompileError> {
        let role = if case.is_default() {
            Role::Default
        } else {
            Role::Case
        };
        self.invoke_body(cx, role, Body::Clause(case), strict)
    }
}

impl<'ast> StatementVisitor<'ast> for CodeGenerator<'_> {
    type Context = UnitContext;
    type Error = CompileError;

    fn visit_block(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast BlockStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statement_list(cx, &node.body, strict)
    }

    fn visit_variable_declaration(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast VariableDeclaration,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.variable_initializers(cx, node, strict)?;
        cx.emitter.normal_completion();
        Ok(())
    }

    fn visit_function_declaration(
        &mut self,
        cx: &mut UnitContext,
        _node: &'ast Function,
        _strict: bool,
    ) -> Result<(), CompileError> {
        // Bound by the declaration prologue of the enclosing body.
        cx.emitter.normal_completion();
        Ok(())
    }

    fn visit_expression_statement(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ExpressionStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.expression(cx, &node.expression, strict)?;
        cx.emitter.value_completion();
        Ok(())
    }

    fn visit_if(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast IfStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        let else_label = cx.emitter.new_label();
        let end = cx.emitter.new_label();

        self.condition(cx, &node.test, strict)?;
        cx.emitter.jump_if_false(else_label);
        self.invoke_body(cx, Role::Then, Body::Statement(&node.consequent), strict)?;
        cx.emitter.jump(end);

        cx.emitter.place_label(else_label)?;
        match &node.alternate {
            Some(alternate) => {
                self.invoke_body(cx, Role::Else, Body::Statement(alternate), strict)?
            }
            None => cx.emitter.normal_completion(),
        }
        cx.emitter.place_label(end)
    }

    fn visit_while(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast WhileStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        let labels = cx.take_labels();
        let test = cx.emitter.new_label();
        let done = cx.emitter.new_label();

        cx.emitter.normal_completion();
        cx.emitter.place_label(test)?;
        self.condition(cx, &node.test, strict)?;
        cx.emitter.jump_if_false(done);
        self.iteration(cx, &labels, &node.body, test, done, strict)?;
        cx.emitter.place_label(done)
    }

    fn visit_do_while(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast DoWhileStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        let labels = cx.take_labels();
        let top = cx.emitter.new_label();
        let test = cx.emitter.new_label();
        let done = cx.emitter.new_label();

        cx.emitter.normal_completion();
        cx.emitter.place_label(top)?;
        self.iteration(cx, &labels, &node.body, test, done, strict)?;
        cx.emitter.place_label(test)?;
        self.condition(cx, &node.test, strict)?;
        cx.emitter.jump_if_true(top);
        cx.emitter.place_label(done)
    }

    fn visit_for(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ForStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        let labels = cx.take_labels();
        let test = cx.emitter.new_label();
        let update = cx.emitter.new_label();
        let done = cx.emitter.new_label();

        match &node.init {
            Some(ForInit::Declaration(declaration)) => {
                self.variable_initializers(cx, declaration, strict)?
            }
            Some(ForInit::Expression(init)) => {
                self.expression(cx, init, strict)?;
                cx.emitter.pop();
            }
            None => {}
        }

        cx.emitter.normal_completion();
        cx.emitter.place_label(test)?;
        if let Some(test_expr) = &node.test {
            self.condition(cx, test_expr, strict)?;
            cx.emitter.jump_if_false(done);
        }
        self.iteration(cx, &labels, &node.body, update, done, strict)?;

        cx.emitter.place_label(update)?;
        if let Some(update_expr) = &node.update {
            self.expression(cx, update_expr, strict)?;
            cx.emitter.pop();
        }
        cx.emitter.jump(test);
        cx.emitter.place_label(done)
    }

    fn visit_for_in(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ForInStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        let labels = cx.take_labels();
        let next = cx.emitter.new_label();
        let done = cx.emitter.new_label();

        // keys, cursor, object, current key
        let keys = cx.emitter.allocate_temps(4)?;
        let cursor = Temporary::new(keys.index + 1);
        let object = Temporary::new(keys.index + 2);
        let key = Temporary::new(keys.index + 3);

        let declared = match &node.left {
            ForInLeft::Declaration(declaration) => {
                let [declarator] = declaration.declarations.as_slice() else {
                    return Err(cx.unsupported("for-in with several declarations"));
                };
                self.variable_initializers(cx, declaration, strict)?;
                Some(cx.emitter.variable(&declarator.id.name)?)
            }
            ForInLeft::Expression(_) => None,
        };

        cx.emitter.normal_completion();
        self.expression(cx, &node.right, strict)?;
        cx.emitter.dup();
        cx.emitter.store_temp(object);
        cx.emitter.call_helper(Helper::EnumerateKeys, 1)?;
        cx.emitter.store_temp(keys);
        cx.emitter.load_constant(Constant::Number(0.0))?;
        cx.emitter.store_temp(cursor);

        cx.emitter.place_label(next)?;
        cx.emitter.emit(Instruction::ForInStep {
            keys,
            exhausted: done,
        });
        cx.emitter.store_temp(key);
        let reference = match (&node.left, declared) {
            (_, Some(binding)) => super::Reference::Binding(binding),
            (ForInLeft::Expression(target), None) => self.reference(cx, target, strict)?,
            (ForInLeft::Declaration(_), None) => {
                return Err(cx.unsupported("for-in declaration without a binding"));
            }
        };
        cx.emitter.load_temp(key)?;
        self.put_reference(cx, reference, strict)?;
        cx.emitter.pop();

        self.iteration(cx, &labels, &node.body, next, done, strict)?;
        cx.emitter.place_label(done)
    }

    fn visit_switch(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast SwitchStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        let labels = cx.take_labels();
        let abrupt = cx.emitter.new_label();
        let brk = cx.emitter.new_label();
        let done = cx.emitter.new_label();
        let bodies: Vec<Label> = node.cases.iter().map(|_| cx.emitter.new_label()).collect();

        let discriminant = cx.emitter.allocate_temp()?;
        self.expression(cx, &node.discriminant, strict)?;
        cx.emitter.store_temp(discriminant);
        cx.emitter.normal_completion();

        let mut default = None;
        for (case, &body) in node.cases.iter().zip(&bodies) {
            match &case.test {
                Some(test) => {
                    cx.emitter.load_temp(discriminant)?;
                    self.expression(cx, test, strict)?;
                    cx.emitter.call_helper(Helper::StrictEqual, 2)?;
                    cx.emitter.jump_if_true(body);
                }
                None => default = Some(body),
            }
        }
        cx.emitter.jump(default.unwrap_or(done));

        // Bodies are laid out in source order so matched clauses fall through.
        for (case, &body) in node.cases.iter().zip(&bodies) {
            cx.emitter.place_label(body)?;
            self.switch_body(cx, case, strict)?;
            cx.emitter.jump_if_abrupt(abrupt);
            cx.emitter.merge_completion();
        }
        cx.emitter.jump(done);

        cx.emitter.place_label(abrupt)?;
        cx.emitter.jump_if_breaks_here(&labels, brk);
        cx.emitter.swap();
        cx.emitter.pop();
        cx.emitter.jump(done);

        cx.emitter.place_label(brk)?;
        cx.emitter.merge_completion();
        cx.emitter.place_label(done)
    }

    fn visit_case_clause(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast SwitchCase,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statement_list(cx, &node.consequent, strict)
    }

    fn visit_default_clause(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast SwitchCase,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statement_list(cx, &node.consequent, strict)
    }

    fn visit_try(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast TryStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        if node.handler.is_none() && node.finalizer.is_none() {
            return Err(cx.unsupported("try without catch or finally"));
        }

        self.invoke_body(cx, Role::Body, Body::Block(&node.block), strict)?;

        if let Some(handler) = &node.handler {
            let after_catch = cx.emitter.new_label();
            cx.emitter.jump_if_not_kind(CompletionKind::Throw, after_catch);
            cx.emitter.unwrap_completion();
            let param = cx.emitter.variable(&handler.param.name)?;
            cx.emitter.emit(Instruction::EnterCatchScope(param));
            self.invoke_body(cx, Role::Catch, Body::Catch(handler), strict)?;
            cx.emitter.emit(Instruction::ExitScope);
            cx.emitter.place_label(after_catch)?;
        }

        if let Some(finalizer) = &node.finalizer {
            let override_label = cx.emitter.new_label();
            let end = cx.emitter.new_label();
            self.invoke_body(cx, Role::Finally, Body::Block(finalizer), strict)?;
            cx.emitter.jump_if_abrupt(override_label);
            cx.emitter.pop();
            cx.emitter.jump(end);
            cx.emitter.place_label(override_label)?;
            cx.emitter.swap();
            cx.emitter.pop();
            cx.emitter.place_label(end)?;
        }
        Ok(())
    }

    fn visit_catch_clause(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast CatchClause,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statement_list(cx, &node.body.body, strict)
    }

    fn visit_throw(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ThrowStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.expression(cx, &node.argument, strict)?;
        cx.emitter.throw_completion();
        Ok(())
    }

    fn visit_return(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ReturnStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        match &node.argument {
            Some(argument) => self.expression(cx, argument, strict)?,
            None => cx.emitter.load_constant(Constant::Undefined)?,
        }
        cx.emitter.return_completion();
        Ok(())
    }

    fn visit_break(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast BreakStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        cx.emitter
            .break_completion(node.label.as_ref().map(|label| label.name.clone()));
        Ok(())
    }

    fn visit_continue(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ContinueStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        cx.emitter
            .continue_completion(node.label.as_ref().map(|label| label.name.clone()));
        Ok(())
    }

    fn visit_labeled(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast LabeledStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        let name = node.label.name.clone();
        if node.body.is_breakable() || matches!(*node.body, Statement::Labeled(_)) {
            cx.pending_labels.push(name.clone());
        } else {
            cx.pending_labels.clear();
        }
        node.body.accept(self, cx, strict)?;
        cx.emitter.consume_break(LabelSet::single(name));
        Ok(())
    }

    fn visit_print(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast PrintStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.expression(cx, &node.argument, strict)?;
        cx.emitter.call_helper(Helper::Print, 1)?;
        cx.emitter.pop();
        cx.emitter.normal_completion();
        Ok(())
    }

    fn visit_with(
        &mut self,
        cx: &mut UnitContext,
        _node: &'ast WithStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Err(cx.unsupported("with statement"))
    }

    fn visit_empty(&mut self, cx: &mut UnitContext, _strict: bool) -> Result<(), CompileError> {
        cx.emitter.normal_completion();
        Ok(())
    }
}
