use indexmap::IndexMap;
use rand::Rng;

use crate::errors::{ErrorKind, ScriptError};
use crate::runtime::Runtime;
use crate::value::{NativeArity, NativeFunction, Value};

pub const MODULE_HELP: &str = "A module for random numbers, choices, and the like.";

pub fn exports() -> IndexMap<String, Value> {
    let mut exports = IndexMap::new();
    exports.insert(
        "randnum".to_string(),
        Value::Native(NativeFunction {
            name: "randnum",
            help: Some("Gets a random number between the two given numbers, inclusive."),
            arity: NativeArity::Exact(2),
            func: randnum,
        }),
    );
    exports.insert(
        "choice".to_string(),
        Value::Native(NativeFunction {
            name: "choice",
            help: Some("Returns a random choice from the given arguments."),
            arity: NativeArity::Range { min: 0, max: None },
            func: choice,
        }),
    );
    exports
}

fn randnum(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let low = super::expect_integer(&args[0], "random.randnum", line)?;
    let high = super::expect_integer(&args[1], "random.randnum", line)?;
    if low > high {
        return Err(ScriptError::new(
            ErrorKind::Argument,
            line,
            format!("random.randnum expects low <= high, got {} and {}", low, high),
        ));
    }
    let mut rng = rand::thread_rng();
    Ok(Value::Integer(rng.gen_range(low..=high)))
}

fn choice(_line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    if args.is_empty() {
        return Ok(Value::Null);
    }
    let mut rng = rand::thread_rng();
    let index = rng.gen_range(0..args.len());
    Ok(args[index].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn randnum_stays_in_bounds() {
        let mut runtime = Runtime::new("<test>");
        for _ in 0..32 {
            let value = randnum(1, &mut runtime, &[Value::Integer(1), Value::Integer(3)])
                .expect("randnum");
            match value {
                Value::Integer(n) => assert!((1..=3).contains(&n)),
                other => panic!("expected integer, got {:?}", other),
            }
        }
    }

    #[test]
    fn randnum_rejects_inverted_bounds() {
        let mut runtime = Runtime::new("<test>");
        let err = randnum(2, &mut runtime, &[Value::Integer(5), Value::Integer(1)])
            .expect_err("inverted");
        assert_eq!(err.kind, ErrorKind::Argument);
    }

    #[test]
    fn choice_picks_one_of_the_arguments() {
        let mut runtime = Runtime::new("<test>");
        let options = [Value::Integer(1), Value::Integer(2)];
        for _ in 0..16 {
            let picked = choice(1, &mut runtime, &options).expect("choice");
            assert!(options.contains(&picked));
        }
        assert_eq!(choice(1, &mut runtime, &[]).expect("empty"), Value::Null);
    }
}
