use mambascript::{evaluate, Runtime, Value};

fn run(src: &str) -> Runtime {
    evaluate(src, "<test>", Vec::new()).expect("script should evaluate")
}

#[test]
fn literal_round_trips() {
    let runtime = run("$a = 41\n$b = \"hello\"\n$c = true\n$d = none");
    assert_eq!(runtime.get("a"), Some(Value::Integer(41)));
    assert_eq!(runtime.get("b"), Some(Value::String("hello".to_string())));
    assert_eq!(runtime.get("c"), Some(Value::Boolean(true)));
    assert_eq!(runtime.get("d"), Some(Value::Null));
}

#[test]
fn basic_arithmetic() {
    let runtime = run("$sum = 2 + 3\n$diff = 9 - 4\n$product = 6 * 7\n$quotient = 7 / 2\n$rest = 7 % 3");
    assert_eq!(runtime.get("sum"), Some(Value::Integer(5)));
    assert_eq!(runtime.get("diff"), Some(Value::Integer(5)));
    assert_eq!(runtime.get("product"), Some(Value::Integer(42)));
    assert_eq!(runtime.get("quotient"), Some(Value::Integer(3)));
    assert_eq!(runtime.get("rest"), Some(Value::Integer(1)));
}

#[test]
fn chained_operators_evaluate_right_to_left() {
    // 10 - (4 - 3), not (10 - 4) - 3.
    let runtime = run("$x = 10 - 4 - 3");
    assert_eq!(runtime.get("x"), Some(Value::Integer(9)));

    let runtime = run("$x = (10 - 4) - 3");
    assert_eq!(runtime.get("x"), Some(Value::Integer(3)));
}

#[test]
fn string_operators() {
    let runtime = run("$joined = \"ab\" + \"cd\"\n$tripled = \"ab\" * 3");
    assert_eq!(runtime.get("joined"), Some(Value::String("abcd".to_string())));
    assert_eq!(
        runtime.get("tripled"),
        Some(Value::String("ababab".to_string()))
    );
}

#[test]
fn comparisons_produce_booleans() {
    let runtime = run("$gt = 2 > 1\n$eq = 3 is 3\n$ne = 3 isnot 3\n$word = \"bc\" in \"abcd\"\n$missing = \"zz\" !in \"abcd\"");
    assert_eq!(runtime.get("gt"), Some(Value::Boolean(true)));
    assert_eq!(runtime.get("eq"), Some(Value::Boolean(true)));
    assert_eq!(runtime.get("ne"), Some(Value::Boolean(false)));
    assert_eq!(runtime.get("word"), Some(Value::Boolean(true)));
    assert_eq!(runtime.get("missing"), Some(Value::Boolean(true)));
}

#[test]
fn add_and_say_scenario() {
    let runtime = run("func add(a, b) {\nreturn a + b\n}\n$x = add(2, 3)\nsay($x)");
    assert_eq!(runtime.get("x"), Some(Value::Integer(5)));
}

#[test]
fn if_else_if_else_takes_the_middle_branch() {
    let src = "if (1 is 2) {\n$y = \"a\"\n} else if (1 is 1) {\n$y = \"b\"\n} else {\n$y = \"c\"\n}";
    let runtime = run(src);
    assert_eq!(runtime.get("y"), Some(Value::String("b".to_string())));
}

#[test]
fn else_branch_runs_when_nothing_matches() {
    let src = "if (1 is 2) {\n$y = \"a\"\n} else if (1 is 3) {\n$y = \"b\"\n} else {\n$y = \"c\"\n}";
    let runtime = run(src);
    assert_eq!(runtime.get("y"), Some(Value::String("c".to_string())));
}

#[test]
fn format_builtin_builds_strings() {
    let runtime = run("$msg = format(\"{} + {} = {}\", 2, 3, 5)");
    assert_eq!(
        runtime.get("msg"),
        Some(Value::String("2 + 3 = 5".to_string()))
    );
}

#[test]
fn comments_are_ignored() {
    let runtime = run("// leading note\n$x = 1 // trailing note\n// closing note");
    assert_eq!(runtime.get("x"), Some(Value::Integer(1)));
}

#[test]
fn sigil_and_bare_spellings_share_bindings() {
    let runtime = run("$x = 1\ny = x + 1\n$z = $y + 1");
    assert_eq!(runtime.get("z"), Some(Value::Integer(3)));
}
