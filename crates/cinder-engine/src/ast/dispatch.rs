// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Double dispatch over the program tree.
//!
//! Every node kind has exactly one handler on the visitor trait, and `accept`
//! routes a node to it with an exhaustive match, so adding a node kind without
//! a handler is a compile error rather than a silent fallthrough. Handlers
//! receive the visitor's context and the strict-mode flag of the enclosing
//! code and report failure through the visitor's error type.

use super::*;

/// Handlers for every statement kind, plus the clause nodes that are
/// compiled as their own bodies.
pub trait StatementVisitor<'ast> {
    type Context;
    type Error;

    fn visit_block(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast BlockStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_variable_declaration(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast VariableDeclaration,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_function_declaration(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast Function,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_expression_statement(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ExpressionStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_if(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast IfStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_while(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast WhileStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_do_while(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast DoWhileStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_for(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ForStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_for_in(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ForInStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_switch(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast SwitchStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    /// A `case test:` clause.
    fn visit_case_clause(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast SwitchCase,
        strict: bool,
    ) -> Result<(), Self::Error>;

    /// The `default:` clause.
    fn visit_default_clause(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast SwitchCase,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_try(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast TryStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_catch_clause(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast CatchClause,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_throw(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ThrowStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_return(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ReturnStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_break(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast BreakStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_continue(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ContinueStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_labeled(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast LabeledStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_print(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast PrintStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_with(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast WithStatement,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_empty(&mut self, cx: &mut Self::Context, strict: bool) -> Result<(), Self::Error>;
}

impl Statement {
    /// Routes this statement to its handler on `visitor`.
    pub fn accept<'ast, V>(
        &'ast self,
        visitor: &mut V,
        cx: &mut V::Context,
        strict: bool,
    ) -> Result<(), V::Error>
    where
        V: StatementVisitor<'ast>,
    {
        match self {
            Statement::Block(node) => visitor.visit_block(cx, node, strict),
            Statement::VariableDeclaration(node) => {
                visitor.visit_variable_declaration(cx, node, strict)
            }
            Statement::FunctionDeclaration(node) => {
                visitor.visit_function_declaration(cx, node, strict)
            }
            Statement::Expression(node) => visitor.visit_expression_statement(cx, node, strict),
            Statement::If(node) => visitor.visit_if(cx, node, strict),
            Statement::While(node) => visitor.visit_while(cx, node, strict),
            Statement::DoWhile(node) => visitor.visit_do_while(cx, node, strict),
            Statement::For(node) => visitor.visit_for(cx, node, strict),
            Statement::ForIn(node) => visitor.visit_for_in(cx, node, strict),
            Statement::Switch(node) => visitor.visit_switch(cx, node, strict),
            Statement::Try(node) => visitor.visit_try(cx, node, strict),
            Statement::Throw(node) => visitor.visit_throw(cx, node, strict),
            Statement::Return(node) => visitor.visit_return(cx, node, strict),
            Statement::Break(node) => visitor.visit_break(cx, node, strict),
            Statement::Continue(node) => visitor.visit_continue(cx, node, strict),
            Statement::Labeled(node) => visitor.visit_labeled(cx, node, strict),
            Statement::Print(node) => visitor.visit_print(cx, node, strict),
            Statement::With(node) => visitor.visit_with(cx, node, strict),
            Statement::Empty => visitor.visit_empty(cx, strict),
        }
    }
}

impl SwitchCase {
    /// Routes to the case or default handler depending on the clause shape.
    pub fn accept<'ast, V>(
        &'ast self,
        visitor: &mut V,
        cx: &mut V::Context,
        strict: bool,
    ) -> Result<(), V::Error>
    where
        V: StatementVisitor<'ast>,
    {
        if self.test.is_some() {
            visitor.visit_case_clause(cx, self, strict)
        } else {
            visitor.visit_default_clause(cx, self, strict)
        }
    }

    pub fn is_default(&self) -> bool {
        self.test.is_none()
    }
}

impl CatchClause {
    pub fn accept<'ast, V>(
        &'ast self,
        visitor: &mut V,
        cx: &mut V::Context,
        strict: bool,
    ) -> Result<(), V::Error>
    where
        V: StatementVisitor<'ast>,
    {
        visitor.visit_catch_clause(cx, self, strict)
    }
}

/// Handlers for every expression kind and object literal member kind.
pub trait ExpressionVisitor<'ast> {
    type Context;
    type Error;

    fn visit_this(&mut self, cx: &mut Self::Context, strict: bool) -> Result<(), Self::Error>;

    fn visit_undefined(&mut self, cx: &mut Self::Context, strict: bool)
    -> Result<(), Self::Error>;

    fn visit_null(&mut self, cx: &mut Self::Context, strict: bool) -> Result<(), Self::Error>;

    fn visit_boolean(
        &mut self,
        cx: &mut Self::Context,
        value: bool,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_number(
        &mut self,
        cx: &mut Self::Context,
        value: f64,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_string(
        &mut self,
        cx: &mut Self::Context,
        value: &'ast str,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_regexp(
        &mut self,
        cx: &mut Self::Context,
        pattern: &'ast str,
        flags: &'ast str,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_identifier(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast Identifier,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_array(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ArrayExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_object(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ObjectExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    /// `key: value` inside an object literal.
    fn visit_named_value(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ValueProperty,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_property_get(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast AccessorProperty,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_property_set(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast AccessorProperty,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_function(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast Function,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_member(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast MemberExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_call(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast CallExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_new(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast NewExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_unary(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast UnaryExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_update(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast UpdateExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_binary(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast BinaryExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_logical(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast LogicalExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_conditional(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast ConditionalExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_assignment(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast AssignmentExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;

    fn visit_sequence(
        &mut self,
        cx: &mut Self::Context,
        node: &'ast SequenceExpression,
        strict: bool,
    ) -> Result<(), Self::Error>;
}

impl Expression {
    /// Routes this expression to its handler on `visitor`.
    pub fn accept<'ast, V>(
        &'ast self,
        visitor: &mut V,
        cx: &mut V::Context,
        strict: bool,
    ) -> Result<(), V::Error>
    where
        V: ExpressionVisitor<'ast>,
    {
        match self {
            Expression::This => visitor.visit_this(cx, strict),
            Expression::Undefined => visitor.visit_undefined(cx, strict),
            Expression::Null => visitor.visit_null(cx, strict),
            Expression::Boolean { value } => visitor.visit_boolean(cx, *value, strict),
            Expression::Number { value } => visitor.visit_number(cx, *value, strict),
            Expression::String { value } => visitor.visit_string(cx, value, strict),
            Expression::RegExp { pattern, flags } => {
                visitor.visit_regexp(cx, pattern, flags, strict)
            }
            Expression::Identifier(node) => visitor.visit_identifier(cx, node, strict),
            Expression::Array(node) => visitor.visit_array(cx, node, strict),
            Expression::Object(node) => visitor.visit_object(cx, node, strict),
            Expression::Function(node) => visitor.visit_function(cx, node, strict),
            Expression::Member(node) => visitor.visit_member(cx, node, strict),
            Expression::Call(node) => visitor.visit_call(cx, node, strict),
            Expression::New(node) => visitor.visit_new(cx, node, strict),
            Expression::Unary(node) => visitor.visit_unary(cx, node, strict),
            Expression::Update(node) => visitor.visit_update(cx, node, strict),
            Expression::Binary(node) => visitor.visit_binary(cx, node, strict),
            Expression::Logical(node) => visitor.visit_logical(cx, node, strict),
            Expression::Conditional(node) => visitor.visit_conditional(cx, node, strict),
            Expression::Assignment(node) => visitor.visit_assignment(cx, node, strict),
            Expression::Sequence(node) => visitor.visit_sequence(cx, node, strict),
        }
    }
}

impl Property {
    /// Routes an object literal member to the handler for its kind.
    pub fn accept<'ast, V>(
        &'ast self,
        visitor: &mut V,
        cx: &mut V::Context,
        strict: bool,
    ) -> Result<(), V::Error>
    where
        V: ExpressionVisitor<'ast>,
    {
        match self {
            Property::Value(node) => visitor.visit_named_value(cx, node, strict),
            Property::Accessor(node) => match node.kind {
                AccessorKind::Get => visitor.visit_property_get(cx, node, strict),
                AccessorKind::Set => visitor.visit_property_set(cx, node, strict),
            },
        }
    }
}
