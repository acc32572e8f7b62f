use mambascript::{evaluate, ErrorKind, Runtime, ScriptError, Value};

fn run(src: &str) -> Runtime {
    evaluate(src, "<test>", Vec::new()).expect("script should evaluate")
}

fn run_err(src: &str) -> ScriptError {
    evaluate(src, "<test>", Vec::new()).expect_err("script should fail")
}

#[test]
fn functions_return_values() {
    let runtime = run("func add(a, b) {\nreturn a + b\n}\n$x = add(2, 3)");
    assert_eq!(runtime.get("x"), Some(Value::Integer(5)));
}

#[test]
fn functions_without_return_yield_null() {
    let runtime = run("func noop() {\n$ignored = 1\n}\n$x = noop()");
    assert_eq!(runtime.get("x"), Some(Value::Null));
}

#[test]
fn overloads_dispatch_by_argument_count() {
    let src = "func f(a) {\nreturn 1\n}\nfunc f(a, b) {\nreturn 2\n}\n$one = f(9)\n$two = f(9, 9)";
    let runtime = run(src);
    assert_eq!(runtime.get("one"), Some(Value::Integer(1)));
    assert_eq!(runtime.get("two"), Some(Value::Integer(2)));
}

#[test]
fn unmatched_arity_is_an_execution_error() {
    let src = "func f(a) {\nreturn 1\n}\nfunc f(a, b) {\nreturn 2\n}\nf(1, 2, 3)";
    let err = run_err(src);
    assert_eq!(err.kind, ErrorKind::Execution);
    assert!(err.message.contains("could not take such arguments"));
}

#[test]
fn optional_parameters_default_to_null() {
    let runtime = run("func g(a, ?b) {\nreturn b\n}\n$x = g(1)\n$y = g(1, 2)");
    assert_eq!(runtime.get("x"), Some(Value::Null));
    assert_eq!(runtime.get("y"), Some(Value::Integer(2)));
}

#[test]
fn defaulted_parameters_use_their_default() {
    let runtime = run("func h(a, b = 5) {\nreturn a + b\n}\n$x = h(2)\n$y = h(2, 10)");
    assert_eq!(runtime.get("x"), Some(Value::Integer(7)));
    assert_eq!(runtime.get("y"), Some(Value::Integer(12)));
}

#[test]
fn omitting_a_required_parameter_is_an_argument_error() {
    // `a` and `c` are required, so two positional arguments select this
    // declaration but leave `c` unbound.
    let src = "func g(a, ?b, c) {\nreturn a\n}\ng(1, 2)";
    let err = run_err(src);
    assert_eq!(err.kind, ErrorKind::Argument);
    assert!(err.message.contains("'c'"));
}

#[test]
fn function_scopes_are_isolated_from_the_caller() {
    let runtime = run("func f() {\n$inner = 1\nreturn 0\n}\n$r = f()");
    assert_eq!(runtime.get("r"), Some(Value::Integer(0)));
    assert_eq!(runtime.get("inner"), None);
}

#[test]
fn functions_can_read_enclosing_bindings() {
    let runtime = run("$offset = 5\nfunc f(n) {\nreturn n + offset\n}\n$x = f(2)");
    assert_eq!(runtime.get("x"), Some(Value::Integer(7)));
}

#[test]
fn return_propagates_out_of_nested_ifs() {
    let src = "func describe(n) {\nif (n is 1) {\nreturn \"one\"\n}\nreturn \"other\"\n}\n$a = describe(1)\n$b = describe(2)";
    let runtime = run(src);
    assert_eq!(runtime.get("a"), Some(Value::String("one".to_string())));
    assert_eq!(runtime.get("b"), Some(Value::String("other".to_string())));
}

#[test]
fn runaway_recursion_trips_the_depth_guard() {
    let err = run_err("func f(n) {\nreturn f(n)\n}\nf(1)");
    assert_eq!(err.kind, ErrorKind::Recursion);
    assert!(err.message.contains("call depth"));
}

#[test]
fn recursion_errors_are_not_catchable() {
    let src = "func f(n) {\nreturn f(n)\n}\ntry {\nf(1)\n}\ncatch {\n$handled = true\n}";
    let err = run_err(src);
    assert_eq!(err.kind, ErrorKind::Recursion);
}

#[test]
fn errors_collect_call_stack_frames() {
    let err = run_err("func f() {\nthrow \"kaboom\"\n}\nf()");
    assert_eq!(err.kind, ErrorKind::Raised);
    assert!(err
        .stack
        .iter()
        .any(|frame| frame.function.as_deref() == Some("f")));
    assert!(err.stack.iter().any(|frame| frame.function.is_none()));
}

#[test]
fn calling_a_non_callable_is_an_execution_error() {
    let err = run_err("$x = 5\nx(1)");
    assert_eq!(err.kind, ErrorKind::Execution);
    assert!(err.message.contains("not callable"));
}
