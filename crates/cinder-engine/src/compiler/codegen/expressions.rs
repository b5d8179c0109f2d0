// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Expression lowering.
//!
//! Every expression leaves exactly one value on the stack. Literals and
//! identifiers become operand loads; everything else goes through stack
//! instructions and runtime helpers.
//!
//! | Expression | Key operations |
//! |------------|----------------|
//! | literals, identifiers | `Load` |
//! | `this` | `LoadThis` |
//! | `a.b`, `a[b]` | `GetProperty` |
//! | `f(x)`, `o.m(x)` | `Call { argc }` with an explicit this value |
//! | `new F(x)` | `Construct { argc }` |
//! | `a op b` | one helper per operator |
//! | `&&`, `\|\|` | `Dup`, `JumpIfFalse`/`JumpIfTrue` |
//! | `x = v`, `o.p op= v` | `Store`, `PutProperty` |
//! | `++x`, `x--` | `ToNumber`, `Add`/`Subtract`, temporaries for postfix |
//! | function expressions | separate `Function_N` unit, `MakeClosure` |
//!
//! ## Method Calls
//!
//! ```text
//! obj.method(a)
//!
//!   [obj]                ; o
//!   Dup                  ; o o
//!   Load "method"        ; o o k
//!   GetProperty          ; o f
//!   [a]                  ; o f a
//!   Call { argc: 1 }     ; r
//! ```

use super::{CodeGenerator, UnitContext};
use crate::ast::*;
use crate::compiler::bytecode::Instruction;
use crate::compiler::error::CompileError;
use crate::compiler::helpers::Helper;
use crate::ir::Constant;

impl CodeGenerator<'_> {
    fn arguments(
        &mut self,
        cx: &mut UnitContext,
        arguments: &[Expression],
        strict: bool,
    ) -> Result<u16, CompileError> {
        let argc = u16::try_from(arguments.len()).map_err(|_| CompileError::TooManyOperands {
            what: "arguments",
            unit: cx.unit_name().to_string(),
        })?;
        for argument in arguments {
            self.expression(cx, argument, strict)?;
        }
        Ok(argc)
    }

    fn update_helper(operator: UpdateOperator) -> Helper {
        match operator {
            UpdateOperator::Increment => Helper::Add,
            UpdateOperator::Decrement => Helper::Subtract,
        }
    }
}

impl<'ast> ExpressionVisitor<'ast> for CodeGenerator<'_> {
    type Context = UnitContext;
    type Error = CompileError;

    fn visit_this(&mut self, cx: &mut UnitContext, _strict: bool) -> Result<(), CompileError> {
        cx.emitter.emit(Instruction::LoadThis);
        Ok(())
    }

    fn visit_undefined(&mut self, cx: &mut UnitContext, _strict: bool) -> Result<(), CompileError> {
        cx.emitter.load_constant(Constant::Undefined)
    }

    fn visit_null(&mut self, cx: &mut UnitContext, _strict: bool) -> Result<(), CompileError> {
        cx.emitter.load_constant(Constant::Null)
    }

    fn visit_boolean(
        &mut self,
        cx: &mut UnitContext,
        value: bool,
        _strict: bool,
    ) -> Result<(), CompileError> {
        cx.emitter.load_constant(Constant::Boolean(value))
    }

    fn visit_number(
        &mut self,
        cx: &mut UnitContext,
        value: f64,
        _strict: bool,
    ) -> Result<(), CompileError> {
        cx.emitter.load_constant(Constant::Number(value))
    }

    fn visit_string(
        &mut self,
        cx: &mut UnitContext,
        value: &'ast str,
        _strict: bool,
    ) -> Result<(), CompileError> {
        cx.emitter.load_constant(Constant::String(value.to_string()))
    }

    fn visit_regexp(
        &mut self,
        cx: &mut UnitContext,
        pattern: &'ast str,
        flags: &'ast str,
        _strict: bool,
    ) -> Result<(), CompileError> {
        cx.emitter.load_constant(Constant::String(pattern.to_string()))?;
        cx.emitter.load_constant(Constant::String(flags.to_string()))?;
        cx.emitter.call_helper(Helper::NewRegExp, 2)
    }

    fn visit_identifier(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast Identifier,
        _strict: bool,
    ) -> Result<(), CompileError> {
        let variable = cx.emitter.variable(&node.name)?;
        cx.emitter.emit(Instruction::Load(variable));
        Ok(())
    }

    fn visit_array(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ArrayExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        let len = u32::try_from(node.elements.len()).map_err(|_| {
            CompileError::TooManyOperands {
                what: "array elements",
                unit: cx.unit_name().to_string(),
            }
        })?;
        for element in &node.elements {
            match element {
                Some(element) => self.expression(cx, element, strict)?,
                None => cx.emitter.load_constant(Constant::Undefined)?,
            }
        }
        cx.emitter
            .call_helper(Helper::NewArray { len }, node.elements.len())
    }

    fn visit_object(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ObjectExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        cx.emitter.call_helper(Helper::NewObject, 0)?;
        for property in &node.properties {
            property.accept(self, cx, strict)?;
        }
        Ok(())
    }

    fn visit_named_value(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ValueProperty,
        strict: bool,
    ) -> Result<(), CompileError> {
        // obj -> obj
        let key = self.literal_key(cx, &node.key)?;
        cx.emitter.load_constant(Constant::String(key))?;
        self.expression(cx, &node.value, strict)?;
        cx.emitter.call_helper(Helper::DefineProperty, 3)
    }

    fn visit_property_get(
        &mut self,
        cx: &mut UnitContext,
        _node: &'ast AccessorProperty,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Err(cx.unsupported("getter in object literal"))
    }

    fn visit_property_set(
        &mut self,
        cx: &mut UnitContext,
        _node: &'ast AccessorProperty,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Err(cx.unsupported("setter in object literal"))
    }

    fn visit_function(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast Function,
        strict: bool,
    ) -> Result<(), CompileError> {
        let function = self.compile_function(node, strict, node.id.is_some())?;
        cx.emitter.make_closure(function);
        Ok(())
    }

    fn visit_member(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast MemberExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.expression(cx, &node.object, strict)?;
        self.property_key(cx, node, strict)?;
        cx.emitter.call_helper(Helper::GetProperty, 2)
    }

    fn visit_call(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast CallExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        match node.callee.as_ref() {
            Expression::Member(member) => {
                self.expression(cx, &member.object, strict)?;
                cx.emitter.dup();
                self.property_key(cx, member, strict)?;
                cx.emitter.call_helper(Helper::GetProperty, 2)?;
            }
            callee => {
                cx.emitter.load_constant(Constant::Undefined)?;
                self.expression(cx, callee, strict)?;
            }
        }
        let argc = self.arguments(cx, &node.arguments, strict)?;
        cx.emitter
            .call_helper(Helper::Call { argc }, usize::from(argc) + 2)
    }

    fn visit_new(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast NewExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.expression(cx, &node.callee, strict)?;
        let argc = self.arguments(cx, &node.arguments, strict)?;
        cx.emitter
            .call_helper(Helper::Construct { argc }, usize::from(argc) + 1)
    }

    fn visit_unary(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast UnaryExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        match node.operator {
            UnaryOperator::Delete => match node.argument.as_ref() {
                Expression::Identifier(id) => {
                    let variable = cx.emitter.variable(&id.name)?;
                    cx.emitter.emit(Instruction::DeleteVariable(variable));
                    Ok(())
                }
                Expression::Member(member) => {
                    self.expression(cx, &member.object, strict)?;
                    self.property_key(cx, member, strict)?;
                    cx.emitter.call_helper(Helper::DeleteProperty { strict }, 2)
                }
                other => {
                    self.expression(cx, other, strict)?;
                    cx.emitter.pop();
                    cx.emitter.load_constant(Constant::Boolean(true))
                }
            },
            UnaryOperator::Void => {
                self.expression(cx, &node.argument, strict)?;
                cx.emitter.pop();
                cx.emitter.load_constant(Constant::Undefined)
            }
            UnaryOperator::Typeof => match node.argument.as_ref() {
                Expression::Identifier(id) => {
                    let variable = cx.emitter.variable(&id.name)?;
                    cx.emitter.emit(Instruction::TypeOfVariable(variable));
                    Ok(())
                }
                other => {
                    self.expression(cx, other, strict)?;
                    cx.emitter.call_helper(Helper::TypeOf, 1)
                }
            },
            operator => {
                let helper = Helper::for_unary(operator)
                    .ok_or_else(|| cx.unsupported("unary operator"))?;
                self.expression(cx, &node.argument, strict)?;
                cx.emitter.call_helper(helper, 1)
            }
        }
    }

    fn visit_update(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast UpdateExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        let helper = Self::update_helper(node.operator);
        let reference = self.reference(cx, &node.argument, strict)?;
        self.get_reference(cx, reference)?;
        cx.emitter.call_helper(Helper::ToNumber, 1)?;

        if node.prefix {
            cx.emitter.load_constant(Constant::Number(1.0))?;
            cx.emitter.call_helper(helper, 2)?;
            return self.put_reference(cx, reference, strict);
        }

        let old = cx.emitter.allocate_temp()?;
        cx.emitter.store_temp(old);
        cx.emitter.load_temp(old)?;
        cx.emitter.load_constant(Constant::Number(1.0))?;
        cx.emitter.call_helper(helper, 2)?;
        self.put_reference(cx, reference, strict)?;
        cx.emitter.pop();
        cx.emitter.load_temp(old)
    }

    fn visit_binary(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast BinaryExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.expression(cx, &node.left, strict)?;
        self.expression(cx, &node.right, strict)?;
        cx.emitter.call_helper(Helper::for_binary(node.operator), 2)
    }

    fn visit_logical(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast LogicalExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        let end = cx.emitter.new_label();
        self.expression(cx, &node.left, strict)?;
        cx.emitter.dup();
        cx.emitter.call_helper(Helper::ToBoolean, 1)?;
        match node.operator {
            LogicalOperator::And => cx.emitter.jump_if_false(end),
            LogicalOperator::Or => cx.emitter.jump_if_true(end),
        }
        cx.emitter.pop();
        self.expression(cx, &node.right, strict)?;
        cx.emitter.place_label(end)
    }

    fn visit_conditional(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast ConditionalExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        let else_label = cx.emitter.new_label();
        let end = cx.emitter.new_label();
        self.condition(cx, &node.test, strict)?;
        cx.emitter.jump_if_false(else_label);
        self.expression(cx, &node.consequent, strict)?;
        cx.emitter.jump(end);
        cx.emitter.place_label(else_label)?;
        self.expression(cx, &node.alternate, strict)?;
        cx.emitter.place_label(end)
    }

    fn visit_assignment(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast AssignmentExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        let reference = self.reference(cx, &node.left, strict)?;
        if let Some(operator) = node.operator.binary_operator() {
            self.get_reference(cx, reference)?;
            self.expression(cx, &node.right, strict)?;
            cx.emitter.call_helper(Helper::for_binary(operator), 2)?;
        } else {
            self.expression(cx, &node.right, strict)?;
        }
        self.put_reference(cx, reference, strict)
    }

    fn visit_sequence(
        &mut self,
        cx: &mut UnitContext,
        node: &'ast SequenceExpression,
        strict: bool,
    ) -> Result<(), CompileError> {
        let Some((last, rest)) = node.expressions.split_last() else {
            return cx.emitter.load_constant(Constant::Undefined);
        };
        for expression in rest {
            self.expression(cx, expression, strict)?;
            cx.emitter.pop();
        }
        self.expression(cx, last, strict)
    }
}
