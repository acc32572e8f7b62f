use std::io::{self, Write};

use indexmap::IndexMap;

use crate::errors::{ErrorKind, ScriptError};
use crate::runtime::Runtime;
use crate::value::{NativeArity, NativeFunction, TypeTag, Value};

/// Builtins bound statically into every initial scope, alongside the
/// `true` / `false` / `null` constants installed by the runtime bootstrap.
pub fn exports() -> IndexMap<String, Value> {
    let mut exports = IndexMap::new();
    exports.insert(
        "say".to_string(),
        native(
            "say",
            "Prints the given values to the console, separated by spaces.",
            NativeArity::Range { min: 0, max: None },
            say,
        ),
    );
    exports.insert(
        "format".to_string(),
        native(
            "format",
            "Replaces each '{}' in the template with the next argument.",
            NativeArity::Range { min: 1, max: None },
            format_template,
        ),
    );
    exports.insert(
        "help".to_string(),
        native(
            "help",
            "Returns the help text attached to a module or native function.",
            NativeArity::Exact(1),
            help,
        ),
    );
    exports.insert("string".to_string(), Value::Type(TypeTag::String));
    exports.insert("integer".to_string(), Value::Type(TypeTag::Integer));
    exports.insert("boolean".to_string(), Value::Type(TypeTag::Boolean));
    exports
}

fn native(
    name: &'static str,
    help: &'static str,
    arity: NativeArity,
    func: fn(usize, &mut Runtime, &[Value]) -> Result<Value, ScriptError>,
) -> Value {
    Value::Native(NativeFunction {
        name,
        help: Some(help),
        arity,
        func,
    })
}

fn say(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let mut stdout = io::stdout().lock();
    let result = (|| {
        for (index, value) in args.iter().enumerate() {
            if index > 0 {
                write!(stdout, " ")?;
            }
            write!(stdout, "{}", value)?;
        }
        writeln!(stdout)?;
        stdout.flush()
    })();
    result.map_err(|err| {
        ScriptError::new(ErrorKind::Execution, line, format!("say failed: {}", err))
    })?;
    Ok(Value::Null)
}

fn format_template(
    line: usize,
    _runtime: &mut Runtime,
    args: &[Value],
) -> Result<Value, ScriptError> {
    let template = super::expect_string(&args[0], "format template", line)?;

    let mut out = String::new();
    let mut rest = template;
    let mut used = 0;
    while let Some(index) = rest.find("{}") {
        out.push_str(&rest[..index]);
        match args.get(1 + used) {
            Some(value) => out.push_str(&value.to_string()),
            None => {
                return Err(ScriptError::new(
                    ErrorKind::Argument,
                    line,
                    "Not enough arguments for the format placeholders",
                ));
            }
        }
        used += 1;
        rest = &rest[index + 2..];
    }
    out.push_str(rest);

    Ok(Value::String(out))
}

fn help(_line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    match &args[0] {
        Value::Module(module) => Ok(Value::String(module.help.trim().to_string())),
        Value::Native(native) => Ok(Value::String(
            native.help.unwrap_or("No help available.").to_string(),
        )),
        _ => Ok(Value::Null),
    }
}
