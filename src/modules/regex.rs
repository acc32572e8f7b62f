use indexmap::IndexMap;
use regex::Regex;

use crate::errors::{ErrorKind, ScriptError};
use crate::runtime::Runtime;
use crate::value::{NativeArity, NativeFunction, Value};

pub const MODULE_HELP: &str = "Match, search, and replace text with regular expressions.";

pub fn exports() -> IndexMap<String, Value> {
    let mut exports = IndexMap::new();
    exports.insert(
        "matches".to_string(),
        Value::Native(NativeFunction {
            name: "matches",
            help: Some("Whether the pattern matches anywhere in the text."),
            arity: NativeArity::Exact(2),
            func: matches,
        }),
    );
    exports.insert(
        "find".to_string(),
        Value::Native(NativeFunction {
            name: "find",
            help: Some("The first match of the pattern in the text, or null."),
            arity: NativeArity::Exact(2),
            func: find,
        }),
    );
    exports.insert(
        "replace".to_string(),
        Value::Native(NativeFunction {
            name: "replace",
            help: Some("Replaces every match of the pattern in the text."),
            arity: NativeArity::Exact(3),
            func: replace,
        }),
    );
    exports
}

fn compile(pattern: &str, line: usize) -> Result<Regex, ScriptError> {
    Regex::new(pattern).map_err(|err| {
        ScriptError::new(
            ErrorKind::Argument,
            line,
            format!("Invalid pattern: {}", err),
        )
    })
}

fn matches(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let pattern = super::expect_string(&args[0], "regex.matches", line)?;
    let text = super::expect_string(&args[1], "regex.matches", line)?;
    Ok(Value::Boolean(compile(pattern, line)?.is_match(text)))
}

fn find(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let pattern = super::expect_string(&args[0], "regex.find", line)?;
    let text = super::expect_string(&args[1], "regex.find", line)?;
    match compile(pattern, line)?.find(text) {
        Some(found) => Ok(Value::String(found.as_str().to_string())),
        None => Ok(Value::Null),
    }
}

fn replace(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let pattern = super::expect_string(&args[0], "regex.replace", line)?;
    let text = super::expect_string(&args[1], "regex.replace", line)?;
    let replacement = super::expect_string(&args[2], "regex.replace", line)?;
    let replaced = compile(pattern, line)?.replace_all(text, replacement);
    Ok(Value::String(replaced.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_and_find() {
        let mut runtime = Runtime::new("<test>");
        assert_eq!(
            matches(
                1,
                &mut runtime,
                &[
                    Value::String("^a+$".to_string()),
                    Value::String("aaa".to_string())
                ]
            )
            .expect("matches"),
            Value::Boolean(true)
        );
        assert_eq!(
            find(
                1,
                &mut runtime,
                &[
                    Value::String("[0-9]+".to_string()),
                    Value::String("order 66 confirmed".to_string())
                ]
            )
            .expect("find"),
            Value::String("66".to_string())
        );
        assert_eq!(
            find(
                1,
                &mut runtime,
                &[
                    Value::String("[0-9]+".to_string()),
                    Value::String("no digits".to_string())
                ]
            )
            .expect("find"),
            Value::Null
        );
    }

    #[test]
    fn replace_rewrites_every_match() {
        let mut runtime = Runtime::new("<test>");
        let replaced = replace(
            1,
            &mut runtime,
            &[
                Value::String("a".to_string()),
                Value::String("banana".to_string()),
                Value::String("o".to_string()),
            ],
        )
        .expect("replace");
        assert_eq!(replaced, Value::String("bonono".to_string()));
    }

    #[test]
    fn invalid_patterns_are_argument_errors() {
        let mut runtime = Runtime::new("<test>");
        let err = matches(
            5,
            &mut runtime,
            &[
                Value::String("(".to_string()),
                Value::String("x".to_string()),
            ],
        )
        .expect_err("bad pattern");
        assert_eq!(err.kind, ErrorKind::Argument);
        assert_eq!(err.line, 5);
    }
}
