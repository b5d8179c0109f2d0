// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Declaration hoisting.
//!
//! `var` declarations and function declarations anywhere in a function body
//! (outside nested functions) bind in the function's scope before any
//! statement runs:
//!
//! ```text
//! // Input:
//! print(x);        // undefined, not an error
//! var x = 5;
//!
//! // Effectively:
//! var x;           // hoisted declaration
//! print(x);
//! x = 5;           // assignment stays in place
//! ```

use crate::ast::*;
use crate::compiler::error::CompileError;

/// Declarations found in one function or program body.
#[derive(Debug, Default)]
pub struct Hoisted<'ast> {
    /// `var` names in first-seen order, without duplicates
    pub vars: Vec<&'ast str>,
    /// Function declarations in source order
    pub functions: Vec<(&'ast str, &'ast Function)>,
}

impl<'ast> Hoisted<'ast> {
    fn add_var(&mut self, name: &'ast str) {
        if !self.vars.contains(&name) {
            self.vars.push(name);
        }
    }

    fn add_declaration(&mut self, declaration: &'ast VariableDeclaration) {
        for declarator in &declaration.declarations {
            self.add_var(&declarator.id.name);
        }
    }
}

/// Statement visitor that collects hoisted declarations without emitting
/// anything. It does not descend into nested functions.
pub struct HoistCollector {
    unit: String,
}

impl HoistCollector {
    pub fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
        }
    }

    fn statements<'ast>(
        &mut self,
        cx: &mut Hoisted<'ast>,
        body: &'ast [Statement],
        strict: bool,
    ) -> Result<(), CompileError> {
        for statement in body {
            statement.accept(self, cx, strict)?;
        }
        Ok(())
    }
}

impl<'ast> StatementVisitor<'ast> for HoistCollector {
    type Context = Hoisted<'ast>;
    type Error = CompileError;

    fn visit_block(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast BlockStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statements(cx, &node.body, strict)
    }

    fn visit_variable_declaration(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast VariableDeclaration,
        _strict: bool,
    ) -> Result<(), CompileError> {
        cx.add_declaration(node);
        Ok(())
    }

    fn visit_function_declaration(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast Function,
        _strict: bool,
    ) -> Result<(), CompileError> {
        let Some(id) = &node.id else {
            return Err(CompileError::unsupported(
                "function declaration without a name",
                &self.unit,
            ));
        };
        cx.functions.push((&id.name, node));
        Ok(())
    }

    fn visit_expression_statement(
        &mut self,
        _cx: &mut Hoisted<'ast>,
        _node: &'ast ExpressionStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Ok(())
    }

    fn visit_if(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast IfStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        node.consequent.accept(self, cx, strict)?;
        if let Some(alternate) = &node.alternate {
            alternate.accept(self, cx, strict)?;
        }
        Ok(())
    }

    fn visit_while(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast WhileStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        node.body.accept(self, cx, strict)
    }

    fn visit_do_while(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast DoWhileStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        node.body.accept(self, cx, strict)
    }

    fn visit_for(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast ForStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        if let Some(ForInit::Declaration(declaration)) = &node.init {
            cx.add_declaration(declaration);
        }
        node.body.accept(self, cx, strict)
    }

    fn visit_for_in(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast ForInStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        if let ForInLeft::Declaration(declaration) = &node.left {
            cx.add_declaration(declaration);
        }
        node.body.accept(self, cx, strict)
    }

    fn visit_switch(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast SwitchStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        for case in &node.cases {
            case.accept(self, cx, strict)?;
        }
        Ok(())
    }

    fn visit_case_clause(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast SwitchCase,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statements(cx, &node.consequent, strict)
    }

    fn visit_default_clause(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast SwitchCase,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statements(cx, &node.consequent, strict)
    }

    fn visit_try(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast TryStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statements(cx, &node.block.body, strict)?;
        if let Some(handler) = &node.handler {
            handler.accept(self, cx, strict)?;
        }
        if let Some(finalizer) = &node.finalizer {
            self.statements(cx, &finalizer.body, strict)?;
        }
        Ok(())
    }

    fn visit_catch_clause(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast CatchClause,
        strict: bool,
    ) -> Result<(), CompileError> {
        self.statements(cx, &node.body.body, strict)
    }

    fn visit_throw(
        &mut self,
        _cx: &mut Hoisted<'ast>,
        _node: &'ast ThrowStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Ok(())
    }

    fn visit_return(
        &mut self,
        _cx: &mut Hoisted<'ast>,
        _node: &'ast ReturnStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Ok(())
    }

    fn visit_break(
        &mut self,
        _cx: &mut Hoisted<'ast>,
        _node: &'ast BreakStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Ok(())
    }

    fn visit_continue(
        &mut self,
        _cx: &mut Hoisted<'ast>,
        _node: &'ast ContinueStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Ok(())
    }

    fn visit_labeled(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast LabeledStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        node.body.accept(self, cx, strict)
    }

    fn visit_print(
        &mut self,
        _cx: &mut Hoisted<'ast>,
        _node: &'ast PrintStatement,
        _strict: bool,
    ) -> Result<(), CompileError> {
        Ok(())
    }

    fn visit_with(
        &mut self,
        cx: &mut Hoisted<'ast>,
        node: &'ast WithStatement,
        strict: bool,
    ) -> Result<(), CompileError> {
        node.body.accept(self, cx, strict)
    }

    fn visit_empty(&mut self, _cx: &mut Hoisted<'ast>, _strict: bool) -> Result<(), CompileError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Statement {
        Statement::VariableDeclaration(VariableDeclaration {
            declarations: vec![VariableDeclarator {
                id: Identifier::new(name),
                init: None,
            }],
        })
    }

    fn function(name: &str) -> Statement {
        Statement::FunctionDeclaration(Function {
            id: Some(Identifier::new(name)),
            params: vec![],
            body: BlockStatement {
                body: vec![var("inner")],
            },
            strict: false,
        })
    }

    fn collect(body: &[Statement]) -> (Vec<String>, Vec<String>) {
        let mut hoisted = Hoisted::default();
        let mut collector = HoistCollector::new("Program_0");
        for statement in body {
            statement.accept(&mut collector, &mut hoisted, false).unwrap();
        }
        (
            hoisted.vars.iter().map(|s| s.to_string()).collect(),
            hoisted.functions.iter().map(|(n, _)| n.to_string()).collect(),
        )
    }

    #[test]
    fn test_collects_nested_vars_once() {
        let body = vec![
            var("a"),
            Statement::If(IfStatement {
                test: Expression::boolean(true),
                consequent: Box::new(Statement::Block(BlockStatement {
                    body: vec![var("b"), var("a")],
                })),
                alternate: None,
            }),
            Statement::While(WhileStatement {
                test: Expression::boolean(false),
                body: Box::new(var("c")),
            }),
        ];
        let (vars, functions) = collect(&body);
        assert_eq!(vars, vec!["a", "b", "c"]);
        assert!(functions.is_empty());
    }

    #[test]
    fn test_does_not_descend_into_functions() {
        let body = vec![function("f"), var("x")];
        let (vars, functions) = collect(&body);
        assert_eq!(vars, vec!["x"]);
        assert_eq!(functions, vec!["f"]);
    }

    #[test]
    fn test_for_and_catch_declarations() {
        let body = vec![
            Statement::For(ForStatement {
                init: Some(ForInit::Declaration(VariableDeclaration {
                    declarations: vec![VariableDeclarator {
                        id: Identifier::new("i"),
                        init: Some(Expression::number(0.0)),
                    }],
                })),
                test: None,
                update: None,
                body: Box::new(Statement::Empty),
            }),
            Statement::Try(TryStatement {
                block: BlockStatement::default(),
                handler: Some(CatchClause {
                    param: Identifier::new("e"),
                    body: BlockStatement {
                        body: vec![var("caught")],
                    },
                }),
                finalizer: None,
            }),
        ];
        let (vars, _) = collect(&body);
        assert_eq!(vars, vec!["i", "caught"]);
    }

    #[test]
    fn test_anonymous_declaration_is_rejected() {
        let body = vec![Statement::FunctionDeclaration(Function {
            id: None,
            params: vec![],
            body: BlockStatement::default(),
            strict: false,
        })];
        let mut hoisted = Hoisted::default();
        let mut collector = HoistCollector::new("Program_0");
        let err = body[0].accept(&mut collector, &mut hoisted, false).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedConstruct { .. }));
    }
}
