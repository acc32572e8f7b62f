//! MambaScript: an embeddable tree-walking interpreter for a small
//! dynamically-typed scripting language.
//!
//! Host applications hand script text plus a set of injected variables to
//! [`evaluate`] and get back a populated [`Runtime`] whose root namespace
//! holds every top-level binding the script created.
//!
//! ```no_run
//! use mambascript::{evaluate, Value};
//!
//! let runtime = evaluate(
//!     "func add(a, b) { return a + b }\n$x = add(2, 3)",
//!     "<example>",
//!     vec![("greeting".to_string(), Value::from("hello"))],
//! )?;
//! assert_eq!(runtime.get("x"), Some(Value::Integer(5)));
//! # Ok::<(), mambascript::ScriptError>(())
//! ```

pub mod ast;
pub mod errors;
pub mod modules;
pub mod parser;
pub mod runtime;
pub mod scope;
pub mod tokenizer;
pub mod value;

use std::fs;
use std::path::Path;

pub use errors::{ErrorKind, ScriptError, StackFrame};
pub use runtime::{CancelToken, Flow, Options, RunState, Runtime};
pub use value::{NativeArity, NativeFn, NativeFunction, NativeObject, TypeTag, Value};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tokenize, parse, and execute `source` with default options, returning
/// the populated runtime. Injected variables are bound statically into the
/// initial scope before the script runs.
pub fn evaluate<I>(source: &str, file: &str, injected: I) -> Result<Runtime, ScriptError>
where
    I: IntoIterator<Item = (String, Value)>,
{
    evaluate_with_options(source, file, injected, Options::default())
}

pub fn evaluate_with_options<I>(
    source: &str,
    file: &str,
    injected: I,
    options: Options,
) -> Result<Runtime, ScriptError>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut runtime = Runtime::with_options(file, options);
    runtime.run(source, injected)?;
    Ok(runtime)
}

/// Read a script from disk and evaluate it, defaulting the file name to
/// the path.
pub fn evaluate_file<I>(path: &Path, injected: I) -> Result<Runtime, ScriptError>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let source = fs::read_to_string(path).map_err(|err| {
        ScriptError::new(
            ErrorKind::Execution,
            0,
            format!("Failed to read {}: {}", path.display(), err),
        )
    })?;
    evaluate(&source, &path.display().to_string(), injected)
}
