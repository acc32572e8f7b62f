use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;

use crate::errors::{ErrorKind, ScriptError};
use crate::runtime::Runtime;
use crate::value::{NativeArity, NativeFunction, Value};

pub const MODULE_HELP: &str = "
A module for basic file-related activities such as reading and writing.
";

pub fn exports() -> IndexMap<String, Value> {
    let mut exports = IndexMap::new();
    exports.insert(
        "read".to_string(),
        native(
            "read",
            "Reads a file and returns its contents. Takes a file path.",
            NativeArity::Exact(1),
            read,
        ),
    );
    exports.insert(
        "write".to_string(),
        native(
            "write",
            "Writes content to a file. Takes a file path and a string.",
            NativeArity::Exact(2),
            write,
        ),
    );
    exports.insert(
        "writeline".to_string(),
        native(
            "writeline",
            "Appends content to a pre-existing file.",
            NativeArity::Exact(2),
            writeline,
        ),
    );
    exports.insert(
        "exists".to_string(),
        native(
            "exists",
            "Tells you whether or not a file exists.",
            NativeArity::Exact(1),
            exists,
        ),
    );
    exports.insert(
        "isdir".to_string(),
        native(
            "isdir",
            "Whether the given path is a directory or not.",
            NativeArity::Exact(1),
            isdir,
        ),
    );
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

fn io_error(line: usize, context: &str, err: std::io::Error) -> ScriptError {
    ScriptError::new(
        ErrorKind::Execution,
        line,
        format!("{}: {}", context, err),
    )
}

fn read(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let path = super::expect_string(&args[0], "files.read", line)?;
    if !Path::new(path).exists() {
        return Err(ScriptError::new(
            ErrorKind::Execution,
            line,
            format!("File {} does not exist", path),
        ));
    }
    let contents = fs::read_to_string(path)
        .map_err(|err| io_error(line, &format!("Failed reading '{}'", path), err))?;
    Ok(Value::String(contents))
}

fn write(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let path = super::expect_string(&args[0], "files.write", line)?;
    let content = super::expect_string(&args[1], "files.write", line)?;
    fs::write(path, content)
        .map_err(|err| io_error(line, &format!("Failed writing '{}'", path), err))?;
    Ok(Value::Null)
}

fn writeline(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let path = super::expect_string(&args[0], "files.writeline", line)?;
    let content = super::expect_string(&args[1], "files.writeline", line)?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| io_error(line, &format!("Failed opening '{}'", path), err))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|err| io_error(line, &format!("Failed appending to '{}'", path), err))?;
    Ok(Value::Null)
}

fn exists(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let path = super::expect_string(&args[0], "files.exists", line)?;
    Ok(Value::Boolean(Path::new(path).exists()))
}

fn isdir(line: usize, _runtime: &mut Runtime, args: &[Value]) -> Result<Value, ScriptError> {
    let path = super::expect_string(&args[0], "files.isdir", line)?;
    Ok(Value::Boolean(Path::new(path).is_dir()))
}
