use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::errors::{ErrorKind, ScriptError};
use crate::runtime::Runtime;
use crate::value::{NativeArity, NativeFunction, Value};

pub const MODULE_HELP: &str =
    "Load JSON text into script values with json.load, and dump them back with json.dump.";

pub fn exports() -> IndexMap<String, Value> {
    let mut exports = IndexMap::new();
    exports.insert(
        "load".to_string(),
        Value::Native(NativeFunction {
            name: "load",
            help: Some("Parses a JSON string into script values."),
            arity: NativeArity::Exact(1),
            func: load,
        }),
    );
    exports.insert(
        "dump".to_string(),
        Value::Native(NativeFunction {
            name: "dump",
            help: Some("Serializes a script value into a JSON string."),
            arity: NativeArity::Exact(1),
            func: dump,
        }),
    );
    exports
}

fn load(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let text = super::expect_string(&args[0], "json.load", line)?;
    let parsed: JsonValue = serde_json::from_str(text).map_err(|err| {
        ScriptError::new(
            ErrorKind::Argument,
            line,
            format!("json.load failed: {}", err),
        )
    })?;
    Ok(json_to_value(&parsed))
}

fn dump(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let json = value_to_json(&args[0], line)?;
    Ok(Value::String(json.to_string()))
}

pub(crate) fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(num) => {
            if let Some(n) = num.as_i64() {
                Value::Integer(n)
            } else if let Some(n) = num.as_u64() {
                Value::Integer(n as i64)
            } else {
                // The language has no float type; non-integral numbers
                // surface as their textual form.
                Value::String(num.to_string())
            }
        }
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        JsonValue::Object(map) => {
            let mut dict = IndexMap::new();
            for (key, value) in map {
                dict.insert(key.clone(), json_to_value(value));
            }
            Value::Dict(dict)
        }
    }
}

pub(crate) fn value_to_json(value: &Value, line: usize) -> Result<JsonValue, ScriptError> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Boolean(b) => Ok(JsonValue::Bool(*b)),
        Value::Integer(n) => Ok(JsonValue::Number((*n).into())),
        Value::String(s) => Ok(JsonValue::String(s.clone())),
        Value::List(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items {
                array.push(value_to_json(item, line)?);
            }
            Ok(JsonValue::Array(array))
        }
        Value::Dict(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map {
                object.insert(key.clone(), value_to_json(value, line)?);
            }
            Ok(JsonValue::Object(object))
        }
        other => Err(ScriptError::new(
            ErrorKind::Argument,
            line,
            format!("json.dump cannot serialize a {} value", other.type_name()),
        )),
    }
}
