use std::rc::Rc;

use indexmap::IndexMap;

use crate::errors::{ErrorKind, ScriptError};
use crate::value::{Module, Value};

pub mod builtins;
pub mod files;
pub mod json;
pub mod random;
pub mod regex;
pub mod requests;

/// The import whitelist: module name mapped to whether the module is
/// "unsafe" (blocked when the host enables safe mode).
pub const MODULES: &[(&str, bool)] = &[
    ("files", true),
    ("json", false),
    ("random", false),
    ("requests", true),
    ("regex", false),
];

pub fn is_importable(name: &str) -> bool {
    MODULES.iter().any(|(module, _)| *module == name)
}

/// Resolve a whitelisted module name into a Module value ready for static
/// binding. Unknown names and safety violations are ModuleErrors.
pub fn resolve(name: &str, safe_mode: bool, line: usize) -> Result<Value, ScriptError> {
    let restricted = match MODULES.iter().find(|(module, _)| *module == name) {
        Some((_, restricted)) => *restricted,
        None => {
            return Err(ScriptError::new(
                ErrorKind::Module,
                line,
                format!("Cannot import '{}'", name),
            ));
        }
    };

    if safe_mode && restricted {
        return Err(ScriptError::new(
            ErrorKind::Module,
            line,
            format!("Module '{}' is unavailable in safe mode", name),
        ));
    }

    let (exports, help) = match name {
        "files" => (files::exports(), files::MODULE_HELP),
        "json" => (json::exports(), json::MODULE_HELP),
        "random" => (random::exports(), random::MODULE_HELP),
        "requests" => (requests::exports(), requests::MODULE_HELP),
        "regex" => (regex::exports(), regex::MODULE_HELP),
        other => {
            return Err(ScriptError::new(
                ErrorKind::Module,
                line,
                format!("Cannot import '{}'", other),
            ));
        }
    };

    Ok(Value::Module(Rc::new(Module {
        name: name.to_string(),
        help,
        exports,
    })))
}

/// The builtin namespace installed statically into every initial scope.
pub fn builtin_exports() -> IndexMap<String, Value> {
    builtins::exports()
}

pub(crate) fn expect_string<'a>(
    value: &'a Value,
    context: &str,
    line: usize,
) -> Result<&'a str, ScriptError> {
    value.as_str().ok_or_else(|| {
        ScriptError::new(
            ErrorKind::Type,
            line,
            format!("{} expects a string, got {}", context, value.type_name()),
        )
    })
}

pub(crate) fn expect_integer(
    value: &Value,
    context: &str,
    line: usize,
) -> Result<i64, ScriptError> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(ScriptError::new(
            ErrorKind::Type,
            line,
            format!("{} expects an integer, got {}", context, other.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_membership() {
        assert!(is_importable("json"));
        assert!(is_importable("files"));
        assert!(!is_importable("sockets"));
    }

    #[test]
    fn unknown_modules_are_module_errors() {
        let err = resolve("sockets", false, 4).expect_err("should fail");
        assert_eq!(err.kind, ErrorKind::Module);
        assert_eq!(err.line, 4);
    }

    #[test]
    fn safe_mode_blocks_restricted_modules() {
        assert!(resolve("files", true, 1).is_err());
        assert!(resolve("requests", true, 1).is_err());
        assert!(resolve("json", true, 1).is_ok());
        assert!(resolve("files", false, 1).is_ok());
    }

    #[test]
    fn resolved_modules_expose_their_exports() {
        let module = resolve("random", false, 1).expect("resolve");
        match module {
            Value::Module(module) => {
                assert!(module.exports.contains_key("randnum"));
                assert!(module.exports.contains_key("choice"));
            }
            other => panic!("expected module, got {:?}", other),
        }
    }
}
