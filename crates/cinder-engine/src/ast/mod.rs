// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Program tree definitions.
//!
//! The tree is produced by an external parser and only read by the compiler.
//! Node names follow the Babel flavour of ESTree, so a tree serialized as
//! `{"type": "IfStatement", ...}` deserializes directly into these types.

mod dispatch;

pub use dispatch::{ExpressionVisitor, StatementVisitor};

use serde::{Deserialize, Serialize};

/// A complete program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
    /// Whether the program starts with a "use strict" directive
    #[serde(default)]
    pub strict: bool,
}

impl Program {
    /// Creates a sloppy-mode program from a statement list.
    pub fn new(body: Vec<Statement>) -> Self {
        Self {
            body,
            strict: false,
        }
    }
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// The name of the identifier
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    /// Block statement { ... }
    #[serde(rename = "BlockStatement")]
    Block(BlockStatement),
    /// var declaration
    VariableDeclaration(VariableDeclaration),
    /// Function declaration
    FunctionDeclaration(Function),
    /// Expression statement
    #[serde(rename = "ExpressionStatement")]
    Expression(ExpressionStatement),
    /// If statement
    #[serde(rename = "IfStatement")]
    If(IfStatement),
    /// While statement
    #[serde(rename = "WhileStatement")]
    While(WhileStatement),
    /// Do-while statement
    #[serde(rename = "DoWhileStatement")]
    DoWhile(DoWhileStatement),
    /// For statement
    #[serde(rename = "ForStatement")]
    For(ForStatement),
    /// For-in statement
    #[serde(rename = "ForInStatement")]
    ForIn(ForInStatement),
    /// Switch statement
    #[serde(rename = "SwitchStatement")]
    Switch(SwitchStatement),
    /// Try statement
    #[serde(rename = "TryStatement")]
    Try(TryStatement),
    /// Throw statement
    #[serde(rename = "ThrowStatement")]
    Throw(ThrowStatement),
    /// Return statement
    #[serde(rename = "ReturnStatement")]
    Return(ReturnStatement),
    /// Break statement (with optional label)
    #[serde(rename = "BreakStatement")]
    Break(BreakStatement),
    /// Continue statement (with optional label)
    #[serde(rename = "ContinueStatement")]
    Continue(ContinueStatement),
    /// Labeled statement
    #[serde(rename = "LabeledStatement")]
    Labeled(LabeledStatement),
    /// Host print statement
    #[serde(rename = "PrintStatement")]
    Print(PrintStatement),
    /// With statement
    #[serde(rename = "WithStatement")]
    With(WithStatement),
    /// Empty statement (;)
    #[serde(rename = "EmptyStatement")]
    Empty,
}

impl Statement {
    /// Returns true for statements that own a label set: loops and switch.
    pub fn is_breakable(&self) -> bool {
        matches!(
            self,
            Statement::While(_)
                | Statement::DoWhile(_)
                | Statement::For(_)
                | Statement::ForIn(_)
                | Statement::Switch(_)
        )
    }
}

/// A `var` declaration statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// A single `name = init` pair of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclarator {
    /// The declared name
    pub id: Identifier,
    /// The initializer, if any
    #[serde(default)]
    pub init: Option<Expression>,
}

/// A function declaration or function expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// The function name (required for declarations)
    #[serde(default)]
    pub id: Option<Identifier>,
    /// The formal parameters
    pub params: Vec<Identifier>,
    /// The function body
    pub body: BlockStatement,
    /// Whether the body starts with a "use strict" directive
    #[serde(default)]
    pub strict: bool,
}

/// An expression statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

/// A block statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockStatement {
    pub body: Vec<Statement>,
}

/// An if statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    /// The test condition
    pub test: Expression,
    /// The consequent (if true)
    pub consequent: Box<Statement>,
    /// The alternate (if false)
    #[serde(default)]
    pub alternate: Option<Box<Statement>>,
}

/// A while statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

/// A do-while statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
}

/// A for statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStatement {
    #[serde(default)]
    pub init: Option<ForInit>,
    #[serde(default)]
    pub test: Option<Expression>,
    #[serde(default)]
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

/// The initializer of a for statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForInit {
    /// `for (var i = 0; ...)`
    Declaration(VariableDeclaration),
    /// `for (i = 0; ...)`
    Expression(Expression),
}

/// A for-in statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForInStatement {
    pub left: ForInLeft,
    pub right: Expression,
    pub body: Box<Statement>,
}

/// The left-hand side of a for-in statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForInLeft {
    /// `for (var key in ...)`
    Declaration(VariableDeclaration),
    /// `for (obj.key in ...)`
    Expression(Expression),
}

/// A switch statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
}

/// A case clause; `test` is `None` for the default clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
}

/// A try statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryStatement {
    pub block: BlockStatement,
    #[serde(default)]
    pub handler: Option<CatchClause>,
    #[serde(default)]
    pub finalizer: Option<BlockStatement>,
}

/// A catch clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub param: Identifier,
    pub body: BlockStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowStatement {
    pub argument: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatement {
    #[serde(default)]
    pub argument: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakStatement {
    #[serde(default)]
    pub label: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueStatement {
    #[serde(default)]
    pub label: Option<Identifier>,
}

/// A labeled statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledStatement {
    pub label: Identifier,
    pub body: Box<Statement>,
}

/// Writes the string form of a value to the host output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintStatement {
    pub argument: Expression,
}

/// A with statement. Parsed, but rejected by the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    /// this keyword
    #[serde(rename = "ThisExpression")]
    This,
    /// The undefined value
    #[serde(rename = "UndefinedLiteral")]
    Undefined,
    /// null literal
    #[serde(rename = "NullLiteral")]
    Null,
    #[serde(rename = "BooleanLiteral")]
    Boolean { value: bool },
    #[serde(rename = "NumericLiteral")]
    Number { value: f64 },
    #[serde(rename = "StringLiteral")]
    String { value: String },
    /// Regular expression literal
    #[serde(rename = "RegExpLiteral")]
    RegExp {
        pattern: String,
        #[serde(default)]
        flags: String,
    },
    /// Identifier reference
    Identifier(Identifier),
    /// Array literal
    #[serde(rename = "ArrayExpression")]
    Array(ArrayExpression),
    /// Object literal
    #[serde(rename = "ObjectExpression")]
    Object(ObjectExpression),
    /// Function expression
    #[serde(rename = "FunctionExpression")]
    Function(Box<Function>),
    /// Member access expression
    #[serde(rename = "MemberExpression")]
    Member(MemberExpression),
    /// Call expression
    #[serde(rename = "CallExpression")]
    Call(CallExpression),
    /// new expression
    #[serde(rename = "NewExpression")]
    New(NewExpression),
    /// Unary expression
    #[serde(rename = "UnaryExpression")]
    Unary(UnaryExpression),
    /// Update expression (++/--)
    #[serde(rename = "UpdateExpression")]
    Update(UpdateExpression),
    /// Binary expression
    #[serde(rename = "BinaryExpression")]
    Binary(BinaryExpression),
    /// Short-circuit && and ||
    #[serde(rename = "LogicalExpression")]
    Logical(LogicalExpression),
    /// Conditional (ternary) expression
    #[serde(rename = "ConditionalExpression")]
    Conditional(ConditionalExpression),
    /// Assignment expression
    #[serde(rename = "AssignmentExpression")]
    Assignment(AssignmentExpression),
    /// Sequence expression (comma operator)
    #[serde(rename = "SequenceExpression")]
    Sequence(SequenceExpression),
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier::new(name))
    }

    pub fn number(value: f64) -> Self {
        Expression::Number { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::String {
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Boolean { value }
    }
}

/// An array expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayExpression {
    /// The elements (None represents a hole)
    pub elements: Vec<Option<Expression>>,
}

/// An object expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
}

/// An object literal member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Property {
    /// `key: value`
    #[serde(rename = "ObjectProperty")]
    Value(ValueProperty),
    /// `get key() {}` or `set key(v) {}`
    #[serde(rename = "ObjectMethod")]
    Accessor(AccessorProperty),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueProperty {
    /// Identifier, string or numeric literal
    pub key: Expression,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorProperty {
    pub kind: AccessorKind,
    pub key: Expression,
    pub params: Vec<Identifier>,
    pub body: BlockStatement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorKind {
    Get,
    Set,
}

/// A member expression, `object.property` or `object[property]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Box<Expression>,
    /// True for the bracket form
    #[serde(default)]
    pub computed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    #[serde(default)]
    pub arguments: Vec<Expression>,
}

/// A unary expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub argument: Box<Expression>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitwiseNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

/// An update expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateExpression {
    pub operator: UpdateOperator,
    pub argument: Box<Expression>,
    /// True for `++x`, false for `x++`
    pub prefix: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOperator {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

/// A binary expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "%")]
    Modulo,
    // Comparison
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "===")]
    StrictEqual,
    #[serde(rename = "!==")]
    StrictNotEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanEqual,
    // Bitwise
    #[serde(rename = "&")]
    BitwiseAnd,
    #[serde(rename = "|")]
    BitwiseOr,
    #[serde(rename = "^")]
    BitwiseXor,
    #[serde(rename = "<<")]
    LeftShift,
    #[serde(rename = ">>")]
    RightShift,
    #[serde(rename = ">>>")]
    UnsignedRightShift,
    // Other
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    InstanceOf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
}

/// An assignment expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentExpression {
    pub operator: AssignmentOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentOperator {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubtractAssign,
    #[serde(rename = "*=")]
    MultiplyAssign,
    #[serde(rename = "/=")]
    DivideAssign,
    #[serde(rename = "%=")]
    ModuloAssign,
    #[serde(rename = "<<=")]
    LeftShiftAssign,
    #[serde(rename = ">>=")]
    RightShiftAssign,
    #[serde(rename = ">>>=")]
    UnsignedRightShiftAssign,
    #[serde(rename = "&=")]
    BitwiseAndAssign,
    #[serde(rename = "|=")]
    BitwiseOrAssign,
    #[serde(rename = "^=")]
    BitwiseXorAssign,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies, or `None` for `=`.
    pub fn binary_operator(self) -> Option<BinaryOperator> {
        use AssignmentOperator::*;
        Some(match self {
            Assign => return None,
            AddAssign => BinaryOperator::Add,
            SubtractAssign => BinaryOperator::Subtract,
            MultiplyAssign => BinaryOperator::Multiply,
            DivideAssign => BinaryOperator::Divide,
            ModuloAssign => BinaryOperator::Modulo,
            LeftShiftAssign => BinaryOperator::LeftShift,
            RightShiftAssign => BinaryOperator::RightShift,
            UnsignedRightShiftAssign => BinaryOperator::UnsignedRightShift,
            BitwiseAndAssign => BinaryOperator::BitwiseAnd,
            BitwiseOrAssign => BinaryOperator::BitwiseOr,
            BitwiseXorAssign => BinaryOperator::BitwiseXor,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_if_statement() {
        let json = r#"{
            "type": "IfStatement",
            "test": {"type": "BooleanLiteral", "value": true},
            "consequent": {"type": "BlockStatement", "body": []}
        }"#;
        let stmt: Statement = serde_json::from_str(json).unwrap();
        match stmt {
            Statement::If(node) => {
                assert_eq!(node.test, Expression::boolean(true));
                assert!(node.alternate.is_none());
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_for_init_forms() {
        let json = r#"{
            "type": "ForStatement",
            "init": {"type": "VariableDeclaration", "declarations": [
                {"id": {"name": "i"}, "init": {"type": "NumericLiteral", "value": 0}}
            ]},
            "body": {"type": "EmptyStatement"}
        }"#;
        let stmt: Statement = serde_json::from_str(json).unwrap();
        let Statement::For(node) = stmt else {
            panic!("expected for statement");
        };
        assert!(matches!(node.init, Some(ForInit::Declaration(_))));
        assert!(node.test.is_none());

        let json = r#"{
            "type": "ForStatement",
            "init": {"type": "Identifier", "name": "i"},
            "body": {"type": "EmptyStatement"}
        }"#;
        let Statement::For(node) = serde_json::from_str(json).unwrap() else {
            panic!("expected for statement");
        };
        assert_eq!(node.init, Some(ForInit::Expression(Expression::identifier("i"))));
    }

    #[test]
    fn test_deserialize_operators() {
        let json = r#"{
            "type": "BinaryExpression",
            "operator": ">>>",
            "left": {"type": "Identifier", "name": "a"},
            "right": {"type": "NumericLiteral", "value": 2}
        }"#;
        let Expression::Binary(node) = serde_json::from_str(json).unwrap() else {
            panic!("expected binary expression");
        };
        assert_eq!(node.operator, BinaryOperator::UnsignedRightShift);
    }

    #[test]
    fn test_compound_assignment_operator() {
        assert_eq!(AssignmentOperator::Assign.binary_operator(), None);
        assert_eq!(
            AssignmentOperator::ModuloAssign.binary_operator(),
            Some(BinaryOperator::Modulo)
        );
    }

    #[test]
    fn test_breakable_statements() {
        let body = Box::new(Statement::Empty);
        assert!(
            Statement::While(WhileStatement {
                test: Expression::boolean(false),
                body
            })
            .is_breakable()
        );
        assert!(!Statement::Empty.is_breakable());
    }
}
