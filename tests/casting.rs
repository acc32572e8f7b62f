use mambascript::{evaluate, ErrorKind, Runtime, ScriptError, Value};

fn run(src: &str) -> Runtime {
    evaluate(src, "<test>", Vec::new()).expect("script should evaluate")
}

fn run_err(src: &str) -> ScriptError {
    evaluate(src, "<test>", Vec::new()).expect_err("script should fail")
}

#[test]
fn casts_between_primitives() {
    let runtime = run("$s = 5 as string\n$n = \"42\" as integer\n$b = \"true\" as boolean\n$i = true as integer\n$t = 0 as boolean");
    assert_eq!(runtime.get("s"), Some(Value::String("5".to_string())));
    assert_eq!(runtime.get("n"), Some(Value::Integer(42)));
    assert_eq!(runtime.get("b"), Some(Value::Boolean(true)));
    assert_eq!(runtime.get("i"), Some(Value::Integer(1)));
    assert_eq!(runtime.get("t"), Some(Value::Boolean(false)));
}

#[test]
fn identity_casts_are_no_ops() {
    let runtime = run("$x = 5 as integer\n$s = \"hi\" as string");
    assert_eq!(runtime.get("x"), Some(Value::Integer(5)));
    assert_eq!(runtime.get("s"), Some(Value::String("hi".to_string())));
}

#[test]
fn null_renders_as_a_string() {
    let runtime = run("$s = none as string");
    assert_eq!(runtime.get("s"), Some(Value::String("null".to_string())));
}

#[test]
fn junk_string_to_integer_is_a_cast_error() {
    let err = run_err("$x = \"abc\" as integer");
    assert_eq!(err.kind, ErrorKind::Cast);
    assert!(err.message.contains("abc"));
}

#[test]
fn unlisted_casts_fail_with_the_target_named() {
    let err = run_err("$x = none as integer");
    assert_eq!(err.kind, ErrorKind::Cast);
    assert!(err.message.contains("integer"));
}

#[test]
fn cast_target_must_be_a_type() {
    let err = run_err("$x = 5 as say");
    assert_eq!(err.kind, ErrorKind::Cast);
    assert!(err.message.contains("type"));
}

#[test]
fn type_objects_are_callable_casts() {
    let runtime = run("$n = integer(\"42\")\n$s = string(7)\n$b = boolean(\"false\")");
    assert_eq!(runtime.get("n"), Some(Value::Integer(42)));
    assert_eq!(runtime.get("s"), Some(Value::String("7".to_string())));
    assert_eq!(runtime.get("b"), Some(Value::Boolean(false)));
}

#[test]
fn type_objects_take_exactly_one_argument() {
    let err = run_err("$n = integer(1, 2)");
    assert_eq!(err.kind, ErrorKind::Argument);
}

#[test]
fn casts_compose_with_comparisons() {
    let runtime = run("$ok = 5 as string is \"5\"");
    assert_eq!(runtime.get("ok"), Some(Value::Boolean(true)));
}
