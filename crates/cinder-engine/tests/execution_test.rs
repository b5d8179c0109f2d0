// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! End-to-end tests: program trees are compiled into units and run on the
//! reference interpreter.

use cinder_engine::{Completion, CompletionKind, Compiler, Config, Engine, Realm, Value, VmError};
use serde_json::{Value as Json, json};

// ============================================================================
// Program tree builders
// ============================================================================

fn num(value: f64) -> Json {
    json!({"type": "NumericLiteral", "value": value})
}

fn string(value: &str) -> Json {
    json!({"type": "StringLiteral", "value": value})
}

fn boolean(value: bool) -> Json {
    json!({"type": "BooleanLiteral", "value": value})
}

fn ident(name: &str) -> Json {
    json!({"type": "Identifier", "name": name})
}

fn binary(operator: &str, left: Json, right: Json) -> Json {
    json!({"type": "BinaryExpression", "operator": operator, "left": left, "right": right})
}

fn logical(operator: &str, left: Json, right: Json) -> Json {
    json!({"type": "LogicalExpression", "operator": operator, "left": left, "right": right})
}

fn assign(operator: &str, target: Json, value: Json) -> Json {
    json!({"type": "AssignmentExpression", "operator": operator, "left": target, "right": value})
}

fn increment(target: Json) -> Json {
    json!({"type": "UpdateExpression", "operator": "++", "argument": target, "prefix": false})
}

fn member(object: Json, property: &str) -> Json {
    json!({"type": "MemberExpression", "object": object, "property": ident(property)})
}

fn index(object: Json, key: Json) -> Json {
    json!({"type": "MemberExpression", "object": object, "property": key, "computed": true})
}

fn call(callee: Json, arguments: Vec<Json>) -> Json {
    json!({"type": "CallExpression", "callee": callee, "arguments": arguments})
}

fn unary(operator: &str, argument: Json) -> Json {
    json!({"type": "UnaryExpression", "operator": operator, "argument": argument})
}

fn object(properties: Vec<(&str, Json)>) -> Json {
    let properties: Vec<Json> = properties
        .into_iter()
        .map(|(key, value)| json!({"type": "ObjectProperty", "key": ident(key), "value": value}))
        .collect();
    json!({"type": "ObjectExpression", "properties": properties})
}

fn function(name: Option<&str>, params: &[&str], body: Vec<Json>) -> Json {
    let params: Vec<Json> = params.iter().map(|p| ident(p)).collect();
    json!({
        "id": name.map(ident),
        "params": params,
        "body": {"type": "BlockStatement", "body": body},
    })
}

fn function_declaration(name: &str, params: &[&str], body: Vec<Json>) -> Json {
    let mut node = function(Some(name), params, body);
    node["type"] = json!("FunctionDeclaration");
    node
}

fn function_expression(params: &[&str], body: Vec<Json>) -> Json {
    let mut node = function(None, params, body);
    node["type"] = json!("FunctionExpression");
    node
}

fn expr(expression: Json) -> Json {
    json!({"type": "ExpressionStatement", "expression": expression})
}

fn var(declarations: Vec<(&str, Option<Json>)>) -> Json {
    let declarations: Vec<Json> = declarations
        .into_iter()
        .map(|(name, init)| json!({"type": "VariableDeclarator", "id": ident(name), "init": init}))
        .collect();
    json!({"type": "VariableDeclaration", "kind": "var", "declarations": declarations})
}

fn block(body: Vec<Json>) -> Json {
    json!({"type": "BlockStatement", "body": body})
}

fn if_stmt(test: Json, consequent: Json, alternate: Option<Json>) -> Json {
    json!({"type": "IfStatement", "test": test, "consequent": consequent, "alternate": alternate})
}

fn for_stmt(init: Json, test: Json, update: Json, body: Json) -> Json {
    json!({"type": "ForStatement", "init": init, "test": test, "update": update, "body": body})
}

fn labeled(label: &str, body: Json) -> Json {
    json!({"type": "LabeledStatement", "label": ident(label), "body": body})
}

fn break_stmt(label: Option<&str>) -> Json {
    json!({"type": "BreakStatement", "label": label.map(ident)})
}

fn continue_stmt(label: Option<&str>) -> Json {
    json!({"type": "ContinueStatement", "label": label.map(ident)})
}

fn return_stmt(argument: Json) -> Json {
    json!({"type": "ReturnStatement", "argument": argument})
}

fn throw_stmt(argument: Json) -> Json {
    json!({"type": "ThrowStatement", "argument": argument})
}

fn print(argument: Json) -> Json {
    json!({"type": "PrintStatement", "argument": argument})
}

// ============================================================================
// Harness
// ============================================================================

fn engine() -> Engine {
    Engine::with_config(Config {
        trace_units: true,
        ..Config::default()
    })
}

fn eval_in(engine: &mut Engine, body: Vec<Json>) -> Completion {
    let tree = json!({ "body": body }).to_string();
    engine.eval_json(&tree).expect("program should compile and run")
}

fn eval(body: Vec<Json>) -> Completion {
    eval_in(&mut engine(), body)
}

fn value_of(body: Vec<Json>) -> Value {
    let completion = eval(body);
    assert_eq!(completion.kind, CompletionKind::Normal, "{:?}", completion);
    completion.value_or_undefined()
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_if_else_picks_branch() {
    let program = |test: bool| {
        vec![if_stmt(
            boolean(test),
            block(vec![expr(string("yes"))]),
            Some(block(vec![expr(string("no"))])),
        )]
    };
    assert_eq!(value_of(program(true)), Value::from("yes"));
    assert_eq!(value_of(program(false)), Value::from("no"));
}

#[test]
fn test_switch_matches_strictly_and_breaks() {
    let case = |test: Option<Json>, result: &str| {
        json!({
            "type": "SwitchCase",
            "test": test,
            "consequent": [expr(assign("=", ident("r"), string(result))), break_stmt(None)],
        })
    };
    let value = value_of(vec![
        var(vec![("r", None)]),
        json!({
            "type": "SwitchStatement",
            "discriminant": num(2.0),
            "cases": [
                case(Some(num(1.0)), "a"),
                case(Some(num(2.0)), "b"),
                case(None, "c"),
                case(Some(string("2")), "d"),
            ],
        }),
        expr(ident("r")),
    ]);
    assert_eq!(value, Value::from("b"));
}

#[test]
fn test_switch_falls_through_from_default() {
    let append = |s: &str| expr(assign("+=", ident("s"), string(s)));
    let value = value_of(vec![
        var(vec![("s", Some(string("")))]),
        json!({
            "type": "SwitchStatement",
            "discriminant": num(5.0),
            "cases": [
                {"type": "SwitchCase", "test": num(1.0), "consequent": [append("a")]},
                {"type": "SwitchCase", "test": null, "consequent": [append("d")]},
                {"type": "SwitchCase", "test": num(2.0), "consequent": [append("b")]},
            ],
        }),
        expr(ident("s")),
    ]);
    assert_eq!(value, Value::from("db"));
}

#[test]
fn test_finally_return_overrides_try_return() {
    let value = value_of(vec![
        function_declaration(
            "f",
            &[],
            vec![json!({
                "type": "TryStatement",
                "block": block(vec![return_stmt(num(1.0))]),
                "finalizer": block(vec![return_stmt(num(2.0))]),
            })],
        ),
        expr(call(ident("f"), vec![])),
    ]);
    assert_eq!(value, Value::Number(2.0));
}

#[test]
fn test_normal_finally_keeps_try_return() {
    let value = value_of(vec![
        var(vec![("x", Some(num(0.0)))]),
        function_declaration(
            "f",
            &[],
            vec![json!({
                "type": "TryStatement",
                "block": block(vec![return_stmt(num(1.0))]),
                "finalizer": block(vec![expr(assign("=", ident("x"), num(5.0)))]),
            })],
        ),
        expr(binary("+", call(ident("f"), vec![]), ident("x"))),
    ]);
    assert_eq!(value, Value::Number(6.0));
}

#[test]
fn test_catch_binds_thrown_value() {
    let value = value_of(vec![json!({
        "type": "TryStatement",
        "block": block(vec![throw_stmt(string("e"))]),
        "handler": {
            "param": ident("err"),
            "body": block(vec![expr(binary("+", ident("err"), string("!")))]),
        },
    })]);
    assert_eq!(value, Value::from("e!"));
}

#[test]
fn test_runtime_fault_is_catchable() {
    let mut engine = engine();
    eval_in(
        &mut engine,
        vec![json!({
            "type": "TryStatement",
            "block": block(vec![expr(ident("missing"))]),
            "handler": {"param": ident("e"), "body": block(vec![print(ident("e"))])},
        })],
    );
    assert_eq!(
        engine.take_output(),
        vec!["ReferenceError: missing is not defined".to_string()]
    );
}

#[test]
fn test_unlabeled_continue_affects_nearest_loop() {
    let loop_over = |name: &str, body: Json| {
        for_stmt(
            var(vec![(name, Some(num(0.0)))]),
            binary("<", ident(name), num(3.0)),
            increment(ident(name)),
            body,
        )
    };
    let value = value_of(vec![
        var(vec![("count", Some(num(0.0)))]),
        loop_over(
            "i",
            block(vec![loop_over(
                "j",
                block(vec![
                    if_stmt(binary("==", ident("j"), num(1.0)), continue_stmt(None), None),
                    expr(increment(ident("count"))),
                ]),
            )]),
        ),
        expr(ident("count")),
    ]);
    assert_eq!(value, Value::Number(6.0));
}

#[test]
fn test_labeled_continue_and_break_reach_outer_loop() {
    let nested = |exit: Json| {
        labeled(
            "outer",
            for_stmt(
                var(vec![("i", Some(num(0.0)))]),
                binary("<", ident("i"), num(3.0)),
                increment(ident("i")),
                block(vec![
                    for_stmt(
                        var(vec![("j", Some(num(0.0)))]),
                        binary("<", ident("j"), num(3.0)),
                        increment(ident("j")),
                        block(vec![expr(increment(ident("n"))), exit]),
                    ),
                    expr(assign("+=", ident("n"), num(100.0))),
                ]),
            ),
        )
    };

    let value = value_of(vec![
        var(vec![("n", Some(num(0.0)))]),
        nested(continue_stmt(Some("outer"))),
        expr(ident("n")),
    ]);
    assert_eq!(value, Value::Number(3.0));

    let value = value_of(vec![
        var(vec![("n", Some(num(0.0)))]),
        nested(break_stmt(Some("outer"))),
        expr(ident("n")),
    ]);
    assert_eq!(value, Value::Number(1.0));
}

#[test]
fn test_break_out_of_labeled_block() {
    let value = value_of(vec![
        var(vec![("n", Some(num(0.0)))]),
        labeled(
            "a",
            block(vec![
                expr(assign("=", ident("n"), num(1.0))),
                break_stmt(Some("a")),
                expr(assign("=", ident("n"), num(2.0))),
            ]),
        ),
        expr(ident("n")),
    ]);
    assert_eq!(value, Value::Number(1.0));
}

#[test]
fn test_do_while_continue_jumps_to_test() {
    let value = value_of(vec![
        var(vec![("i", Some(num(0.0))), ("s", Some(num(0.0)))]),
        json!({
            "type": "DoWhileStatement",
            "body": block(vec![
                expr(increment(ident("i"))),
                if_stmt(binary("==", ident("i"), num(2.0)), continue_stmt(None), None),
                expr(assign("+=", ident("s"), ident("i"))),
            ]),
            "test": binary("<", ident("i"), num(4.0)),
        }),
        expr(ident("s")),
    ]);
    assert_eq!(value, Value::Number(8.0));
}

#[test]
fn test_throw_ends_loop_after_third_body_invocation() {
    let mut engine = engine();
    let completion = eval_in(
        &mut engine,
        vec![
            var(vec![("i", Some(num(0.0)))]),
            json!({
                "type": "WhileStatement",
                "test": boolean(true),
                "body": block(vec![
                    expr(increment(ident("i"))),
                    if_stmt(
                        binary("==", ident("i"), num(3.0)),
                        throw_stmt(string("stop")),
                        None,
                    ),
                ]),
            }),
        ],
    );
    assert_eq!(completion.kind, CompletionKind::Throw);
    assert_eq!(completion.value, Some(Value::from("stop")));
    assert_eq!(engine.unit_invocations("Body_0"), 3);
    assert_eq!(engine.unit_invocations("Then_0"), 1);
}

#[test]
fn test_for_in_skips_deleted_keys() {
    let value = value_of(vec![
        var(vec![
            ("o", Some(object(vec![("a", num(1.0)), ("b", num(2.0)), ("c", num(3.0))]))),
            ("seen", Some(string(""))),
        ]),
        json!({
            "type": "ForInStatement",
            "left": var(vec![("k", None)]),
            "right": ident("o"),
            "body": block(vec![
                expr(assign("+=", ident("seen"), ident("k"))),
                expr(unary("delete", member(ident("o"), "c"))),
            ]),
        }),
        expr(ident("seen")),
    ]);
    assert_eq!(value, Value::from("ab"));
}

#[test]
fn test_temporaries_survive_recursion() {
    // walk(o) keeps its for-in cursor in temporaries while it recurses.
    let walk = function_declaration(
        "walk",
        &["o"],
        vec![
            var(vec![("s", Some(string("")))]),
            json!({
                "type": "ForInStatement",
                "left": var(vec![("k", None)]),
                "right": ident("o"),
                "body": block(vec![
                    expr(assign("+=", ident("s"), ident("k"))),
                    if_stmt(
                        binary(
                            "==",
                            unary("typeof", index(ident("o"), ident("k"))),
                            string("object"),
                        ),
                        expr(assign(
                            "+=",
                            ident("s"),
                            binary(
                                "+",
                                binary("+", string("("), call(ident("walk"), vec![index(ident("o"), ident("k"))])),
                                string(")"),
                            ),
                        )),
                        None,
                    ),
                ]),
            }),
            return_stmt(ident("s")),
        ],
    );
    let tree = object(vec![
        ("a", object(vec![("x", num(1.0)), ("y", num(2.0))])),
        ("b", num(3.0)),
    ]);
    let value = value_of(vec![walk, expr(call(ident("walk"), vec![tree]))]);
    assert_eq!(value, Value::from("a(xy)b"));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_recursive_function() {
    let fact = function_declaration(
        "fact",
        &["n"],
        vec![
            if_stmt(binary("<=", ident("n"), num(1.0)), return_stmt(num(1.0)), None),
            return_stmt(binary(
                "*",
                ident("n"),
                call(ident("fact"), vec![binary("-", ident("n"), num(1.0))]),
            )),
        ],
    );
    let value = value_of(vec![fact, expr(call(ident("fact"), vec![num(5.0)]))]);
    assert_eq!(value, Value::Number(120.0));
}

#[test]
fn test_closures_share_captured_environment() {
    let counter = function_declaration(
        "counter",
        &[],
        vec![
            var(vec![("c", Some(num(0.0)))]),
            return_stmt(function_expression(
                &[],
                vec![
                    expr(assign("=", ident("c"), binary("+", ident("c"), num(1.0)))),
                    return_stmt(ident("c")),
                ],
            )),
        ],
    );
    let value = value_of(vec![
        counter,
        var(vec![("next", Some(call(ident("counter"), vec![])))]),
        expr(call(ident("next"), vec![])),
        expr(call(ident("next"), vec![])),
    ]);
    assert_eq!(value, Value::Number(2.0));
}

#[test]
fn test_constructor_initializes_this() {
    let point = function_declaration(
        "Point",
        &["x"],
        vec![expr(assign("=", member(json!({"type": "ThisExpression"}), "x"), ident("x")))],
    );
    let value = value_of(vec![
        point,
        var(vec![(
            "p",
            Some(json!({"type": "NewExpression", "callee": ident("Point"), "arguments": [num(3.0)]})),
        )]),
        expr(member(ident("p"), "x")),
    ]);
    assert_eq!(value, Value::Number(3.0));
}

#[test]
fn test_method_call_binds_receiver() {
    let value = value_of(vec![
        var(vec![(
            "o",
            Some(object(vec![
                ("v", num(7.0)),
                (
                    "get",
                    function_expression(&[], vec![return_stmt(member(json!({"type": "ThisExpression"}), "v"))]),
                ),
            ])),
        )]),
        expr(call(member(ident("o"), "get"), vec![])),
    ]);
    assert_eq!(value, Value::Number(7.0));
}

#[test]
fn test_call_depth_limit_throws_range_error() {
    let mut engine = Engine::with_config(Config {
        max_call_depth: 32,
        ..Config::default()
    });
    let completion = eval_in(
        &mut engine,
        vec![
            function_declaration("f", &[], vec![return_stmt(call(ident("f"), vec![]))]),
            expr(call(ident("f"), vec![])),
        ],
    );
    assert_eq!(completion.kind, CompletionKind::Throw);
    let error = completion.value_or_undefined();
    assert_eq!(
        engine.display(&error),
        "RangeError: maximum call stack size exceeded"
    );
}

/// `function f(n) { if (n > 0) { return f(n - 1); } return 0; }`
fn countdown() -> Json {
    function_declaration(
        "f",
        &["n"],
        vec![
            if_stmt(
                binary(">", ident("n"), num(0.0)),
                block(vec![return_stmt(call(ident("f"), vec![binary("-", ident("n"), num(1.0))]))]),
                None,
            ),
            return_stmt(num(0.0)),
        ],
    )
}

#[test]
fn test_deep_recursion_within_default_limit() {
    let mut engine = Engine::new();
    let completion = eval_in(
        &mut engine,
        vec![countdown(), expr(call(ident("f"), vec![num(250.0)]))],
    );
    assert_eq!(completion, Completion::normal_with(Value::Number(0.0)));
    assert_eq!(engine.realm().call_depth(), 0);
}

#[test]
fn test_deep_recursion_through_nested_units() {
    // Every level runs Function, Body (try), Body (while) and Then units.
    let looping = json!({
        "type": "WhileStatement",
        "test": boolean(true),
        "body": block(vec![
            if_stmt(
                binary(">", ident("n"), num(0.0)),
                block(vec![return_stmt(call(ident("f"), vec![binary("-", ident("n"), num(1.0))]))]),
                None,
            ),
            return_stmt(num(0.0)),
        ]),
    });
    let f = function_declaration(
        "f",
        &["n"],
        vec![json!({"type": "TryStatement", "block": block(vec![looping]), "finalizer": block(vec![])})],
    );

    let mut engine = Engine::new();
    let completion = eval_in(&mut engine, vec![f, expr(call(ident("f"), vec![num(200.0)]))]);
    assert_eq!(completion, Completion::normal_with(Value::Number(0.0)));
}

#[test]
fn test_runaway_recursion_at_default_limit_throws() {
    let mut engine = Engine::new();
    let completion = eval_in(
        &mut engine,
        vec![countdown(), expr(call(ident("f"), vec![num(100_000.0)]))],
    );
    assert_eq!(completion.kind, CompletionKind::Throw);
    let error = completion.value_or_undefined();
    assert_eq!(
        engine.display(&error),
        "RangeError: maximum call stack size exceeded"
    );
    assert_eq!(engine.realm().call_depth(), 0);

    let completion = eval_in(&mut engine, vec![expr(call(ident("f"), vec![num(3.0)]))]);
    assert_eq!(completion, Completion::normal_with(Value::Number(0.0)));
}

#[test]
fn test_calling_a_non_function_throws() {
    let completion = eval(vec![
        var(vec![("x", Some(num(1.0)))]),
        expr(call(ident("x"), vec![])),
    ]);
    assert_eq!(completion.kind, CompletionKind::Throw);
}

// ============================================================================
// Expressions and modes
// ============================================================================

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(
        value_of(vec![expr(logical("||", num(0.0), string("x")))]),
        Value::from("x")
    );
    assert_eq!(
        value_of(vec![expr(logical("&&", num(1.0), num(0.0)))]),
        Value::Number(0.0)
    );
    // The right side is never evaluated, so the missing name is harmless.
    assert_eq!(
        value_of(vec![expr(logical("&&", boolean(false), ident("missing")))]),
        Value::Boolean(false)
    );
}

#[test]
fn test_typeof_unresolvable_name() {
    assert_eq!(
        value_of(vec![expr(unary("typeof", ident("nowhere")))]),
        Value::from("undefined")
    );
}

#[test]
fn test_strict_assignment_to_undeclared_throws() {
    let body = vec![expr(assign("=", ident("y"), num(1.0)))];

    let mut engine = engine();
    let tree = json!({ "body": body, "strict": true }).to_string();
    let completion = engine.eval_json(&tree).unwrap();
    assert_eq!(completion.kind, CompletionKind::Throw);

    let completion = eval(body);
    assert_eq!(completion, Completion::normal_with(Value::Number(1.0)));
}

#[test]
fn test_print_collects_output() {
    let mut engine = engine();
    eval_in(
        &mut engine,
        vec![print(string("a")), print(binary("+", num(1.0), num(1.0)))],
    );
    assert_eq!(engine.take_output(), vec!["a".to_string(), "2".to_string()]);
}

#[test]
fn test_zero_and_negative_zero_literals_stay_distinct() {
    let mut engine = engine();
    eval_in(
        &mut engine,
        vec![print(num(0.0)), print(binary("/", num(1.0), num(-0.0)))],
    );
    assert_eq!(
        engine.take_output(),
        vec!["0".to_string(), "-Infinity".to_string()]
    );
}

#[test]
fn test_artifact_runs_repeatably() {
    let mut engine = engine();
    let program = serde_json::from_value(json!({
        "body": [expr(binary("+", num(1.0), num(2.0)))]
    }))
    .unwrap();
    let artifact = engine.compile(&program).unwrap();
    for _ in 0..2 {
        let completion = engine.run(&artifact).unwrap();
        assert_eq!(completion, Completion::normal_with(Value::Number(3.0)));
    }
}

#[test]
fn test_top_level_break_is_rejected() {
    let mut engine = engine();
    let tree = json!({ "body": [break_stmt(None)] }).to_string();
    assert!(engine.eval_json(&tree).is_err());
}

#[test]
fn test_top_level_return_is_rejected_by_engine() {
    let mut engine = engine();
    let tree = json!({ "body": [return_stmt(num(1.0))] }).to_string();
    assert!(matches!(
        engine.eval_json(&tree),
        Err(cinder_engine::Error::Vm(VmError::EscapedCompletion {
            kind: CompletionKind::Return,
            ..
        }))
    ));
}

// ============================================================================
// Raw program completions
// ============================================================================

fn completion_of(body: Vec<Json>) -> Completion {
    let program: cinder_engine::Program =
        serde_json::from_value(json!({ "body": body })).expect("valid program tree");
    let artifact = std::sync::Arc::new(Compiler::new().compile(&program).expect("compiles"));
    let mut realm = Realm::new();
    cinder_engine::vm::run_program(&artifact, &mut realm, false).expect("well-formed code")
}

#[test]
fn test_if_true_returns_from_then_unit() {
    let completion = completion_of(vec![if_stmt(
        boolean(true),
        block(vec![return_stmt(num(1.0))]),
        Some(block(vec![return_stmt(num(2.0))])),
    )]);
    assert_eq!(completion, Completion::return_with(Value::Number(1.0)));
}

#[test]
fn test_if_false_without_else_is_normal() {
    let completion = completion_of(vec![if_stmt(
        boolean(false),
        block(vec![return_stmt(num(1.0))]),
        None,
    )]);
    assert_eq!(completion.kind, CompletionKind::Normal);
    assert_eq!(completion.value_or_undefined(), Value::Undefined);
}

#[test]
fn test_switch_returns_from_matching_case() {
    let case = |test: Option<Json>, result: &str| {
        json!({"type": "SwitchCase", "test": test, "consequent": [return_stmt(string(result))]})
    };
    let completion = completion_of(vec![json!({
        "type": "SwitchStatement",
        "discriminant": num(2.0),
        "cases": [case(Some(num(1.0)), "a"), case(Some(num(2.0)), "b"), case(None, "c")],
    })]);
    assert_eq!(completion, Completion::return_with(Value::from("b")));
}

#[test]
fn test_finally_throw_overrides_try_return() {
    let completion = completion_of(vec![json!({
        "type": "TryStatement",
        "block": block(vec![return_stmt(num(1.0))]),
        "finalizer": block(vec![throw_stmt(string("late"))]),
    })]);
    assert_eq!(completion, Completion::throw(Value::from("late")));
}
