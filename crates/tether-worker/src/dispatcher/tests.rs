//! Unit tests for command dispatch.

use mockall::mock;
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::json;
use tether_script::{Arguments, CompileError, LuaEngine, Operation};
use tether_protocol::Severity;

use super::*;
use crate::decoder::CommandDecoder;

mock! {
    Engine {}
    impl ScriptEngine for Engine {
        fn compile(&self, name: &str, source: &str) -> Result<Box<dyn Operation>, CompileError>;
    }
}

fn command(line: &str) -> Command {
    CommandDecoder::new("done").decode(line).expect("valid command")
}

fn echo_first() -> Box<dyn Operation> {
    Box::new(
        |args: &Arguments, context: &mut InvocationContext| -> Result<Value, OperationError> {
            context.log(Severity::Debug, "echoing");
            Ok(args.get("1").cloned().unwrap_or(Value::Null))
        },
    )
}

#[test]
fn definition_is_compiled_installed_and_invoked() {
    let mut engine = MockEngine::new();
    engine
        .expect_compile()
        .with(eq("f"), eq("logic"))
        .times(1)
        .returning(|_, _| Ok(echo_first()));
    let mut dispatcher = Dispatcher::new(engine);

    let outcome = dispatcher.dispatch(&command(
        r#"{"cmd":"f","def":"logic","args":{"1":"hello"}}"#,
    ));

    assert_eq!(
        outcome,
        Outcome::Completed {
            value: json!("hello"),
            emissions: vec![Emission::Log {
                severity: Severity::Debug,
                message: String::from("echoing"),
            }],
        }
    );
    assert!(dispatcher.registry().contains("f"));
}

#[test]
fn stored_operation_is_reused_without_compiling() {
    let mut engine = MockEngine::new();
    engine
        .expect_compile()
        .times(1)
        .returning(|_, _| Ok(echo_first()));
    let mut dispatcher = Dispatcher::new(engine);

    dispatcher.dispatch(&command(r#"{"cmd":"f","def":"logic","args":{"1":"a"}}"#));
    let outcome = dispatcher.dispatch(&command(r#"{"cmd":"f","args":{"1":"b"}}"#));

    assert!(matches!(outcome, Outcome::Completed { value, .. } if value == json!("b")));
}

#[test]
fn unknown_operation_is_not_found() {
    let mut engine = MockEngine::new();
    engine.expect_compile().never();
    let mut dispatcher = Dispatcher::new(engine);

    let outcome = dispatcher.dispatch(&command(r#"{"cmd":"unknown"}"#));

    assert_eq!(
        outcome,
        Outcome::DefinitionNotFound {
            name: String::from("unknown"),
        }
    );
}

#[test]
fn compile_failure_leaves_registry_unchanged() {
    let mut engine = MockEngine::new();
    engine.expect_compile().times(1).returning(|name, _| {
        Err(CompileError::Syntax {
            name: name.to_owned(),
            message: String::from("unexpected symbol"),
        })
    });
    let mut dispatcher = Dispatcher::new(engine);

    let outcome = dispatcher.dispatch(&command(r#"{"cmd":"f","def":"return ("}"#));

    let Outcome::ExecutionFailed { name, error, .. } = outcome else {
        panic!("expected execution failure");
    };
    assert_eq!(name, "f");
    assert_eq!(error.message(), "syntax error in 'f': unexpected symbol");
    assert!(dispatcher.registry().is_empty());
}

#[test]
fn compile_failure_keeps_previous_definition() {
    let mut engine = MockEngine::new();
    let mut calls = 0;
    engine.expect_compile().times(2).returning(move |name, _| {
        calls += 1;
        if calls == 1 {
            Ok(echo_first())
        } else {
            Err(CompileError::Load {
                name: name.to_owned(),
                message: String::from("refused"),
            })
        }
    });
    let mut dispatcher = Dispatcher::new(engine);

    dispatcher.dispatch(&command(r#"{"cmd":"f","def":"good"}"#));
    dispatcher.dispatch(&command(r#"{"cmd":"f","def":"bad"}"#));
    let outcome = dispatcher.dispatch(&command(r#"{"cmd":"f","args":{"1":"still"}}"#));

    assert!(matches!(outcome, Outcome::Completed { value, .. } if value == json!("still")));
}

#[test]
fn native_operations_need_no_engine() {
    let mut engine = MockEngine::new();
    engine.expect_compile().never();
    let registry = OperationRegistry::new().with_operation(
        "sum",
        |args: &Arguments, _: &mut InvocationContext| -> Result<Value, OperationError> {
            let total: i64 = args.values().filter_map(Value::as_i64).sum();
            Ok(json!(total))
        },
    );
    let mut dispatcher = Dispatcher::with_registry(engine, registry);

    let outcome = dispatcher.dispatch(&command(r#"{"cmd":"sum","args":{"a":2,"b":3}}"#));

    assert!(matches!(outcome, Outcome::Completed { value, .. } if value == json!(5)));
}

#[rstest]
#[case::two_arguments(r#"{"1":"hello","2":"there!"}"#, "hello there!")]
#[case::one_argument(r#"{"1":"bye"}"#, "bye ")]
fn lua_definitions_concatenate_arguments(#[case] args: &str, #[case] expected: &str) {
    let engine = LuaEngine::new().expect("interpreter starts");
    let mut dispatcher = Dispatcher::new(engine);
    let line = format!(
        r#"{{"cmd":"join","def":"return (args['1'] or '') .. ' ' .. (args['2'] or '')","args":{args}}}"#
    );

    let outcome = dispatcher.dispatch(&command(&line));

    assert!(
        matches!(&outcome, Outcome::Completed { value, .. } if value == &json!(expected)),
        "outcome: {outcome:?}"
    );
}

#[test]
fn failing_lua_keeps_location_and_emissions() {
    let engine = LuaEngine::new().expect("interpreter starts");
    let mut dispatcher = Dispatcher::new(engine);

    let outcome = dispatcher.dispatch(&command(
        r#"{"cmd":"f","def":"tether.log('about to fail')\nerror('boom')"}"#,
    ));

    let Outcome::ExecutionFailed {
        error, emissions, ..
    } = outcome
    else {
        panic!("expected execution failure");
    };
    assert_eq!(error.location(), Some("f:2"));
    assert_eq!(emissions.len(), 1);
}
