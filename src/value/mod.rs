use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::FunctionDecl;
use crate::errors::{ErrorKind, ScriptError};
use crate::runtime::Runtime;

/// Signature shared by every native (built-in) callable: the call-site line,
/// the running interpreter, and the evaluated positional arguments.
pub type NativeFn = fn(usize, &mut Runtime, &[Value]) -> Result<Value, ScriptError>;

/// Supported arity constraints for native (built-in) functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeArity {
    /// The function expects exactly this many arguments.
    Exact(usize),
    /// The function accepts a range of arguments defined by the inclusive
    /// minimum and an optional maximum. `None` indicates "no upper bound".
    Range { min: usize, max: Option<usize> },
}

impl NativeArity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            NativeArity::Exact(n) => *n == count,
            NativeArity::Range { min, max } => {
                if count < *min {
                    return false;
                }
                match max {
                    Some(max) => count <= *max,
                    None => true,
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            NativeArity::Exact(n) => format!("{} arguments", n),
            NativeArity::Range { min, max } => match max {
                Some(max) if min == max => format!("{} arguments", min),
                Some(max) => format!("{}..={} arguments", min, max),
                None => {
                    if *min == 0 {
                        "any number of arguments".to_string()
                    } else {
                        format!("at least {} arguments", min)
                    }
                }
            },
        }
    }
}

/// A host-provided callable exposed to scripts.
#[derive(Debug, Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub help: Option<&'static str>,
    pub arity: NativeArity,
    pub func: NativeFn,
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

/// Castable primitive type tags; also the identity of the `string` /
/// `integer` / `boolean` type objects bound in the initial scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Integer,
    Boolean,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
        }
    }
}

/// A script-defined callable. Declarations sharing a name accumulate here;
/// calls dispatch to the first declaration whose arity range matches.
#[derive(Debug, Clone)]
pub struct ScriptFunction {
    pub name: String,
    pub overloads: Vec<Rc<FunctionDecl>>,
}

impl ScriptFunction {
    pub fn new(decl: FunctionDecl) -> Self {
        Self {
            name: decl.name.clone(),
            overloads: vec![Rc::new(decl)],
        }
    }

    pub fn select(&self, argc: usize) -> Option<&Rc<FunctionDecl>> {
        self.overloads.iter().find(|decl| decl.accepts(argc))
    }
}

/// An imported standard-library module: a named bag of native exports.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub help: &'static str,
    pub exports: IndexMap<String, Value>,
}

/// Capability interface for host objects exposed to scripts. Attribute
/// lookup goes through `attr`, never reflection; callability and casting
/// are opt-in.
pub trait NativeObject: fmt::Debug {
    fn type_name(&self) -> &str;

    fn attr(&self, name: &str) -> Option<Value>;

    fn call(
        &self,
        line: usize,
        _runtime: &mut Runtime,
        _args: &[Value],
    ) -> Result<Value, ScriptError> {
        Err(ScriptError::new(
            ErrorKind::Execution,
            line,
            format!("'{}' object is not callable", self.type_name()),
        ))
    }

    fn cast(&self, _target: TypeTag) -> Option<Value> {
        None
    }

    fn render(&self) -> String {
        format!("<{}>", self.type_name())
    }
}

/// MambaScript runtime value types
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    Null,
    List(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Function(Rc<ScriptFunction>),
    Native(NativeFunction),
    Module(Rc<Module>),
    Type(TypeTag),
    Object(Rc<dyn NativeObject>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (String(a), String(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Null, Null) => true,
            (List(a), List(b)) => a == b,
            (Dict(a), Dict(b)) => a == b,
            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (Native(a), Native(b)) => a == b,
            (Module(a), Module(b)) => Rc::ptr_eq(a, b),
            (Type(a), Type(b)) => a == b,
            (Object(a), Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Dict(map) => {
                write!(f, "{{")?;
                for (index, (key, value)) in map.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Native(native) => write!(f, "<native function {}>", native.name),
            Value::Module(module) => write!(f, "<module {}>", module.name),
            Value::Type(tag) => write!(f, "<type {}>", tag.name()),
            Value::Object(object) => write!(f, "{}", object.render()),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Native(_) => "native function",
            Value::Module(_) => "module",
            Value::Type(_) => "type",
            Value::Object(object) => object.type_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Wrap a structured host object for injection into a script namespace.
    pub fn object(object: impl NativeObject + 'static) -> Value {
        Value::Object(Rc::new(object))
    }

    /// Cast to a primitive type. Same-type casts are the identity; the
    /// cross-type pairs are explicitly enumerated and anything else fails
    /// with a CastError naming the target type.
    pub fn cast_to(&self, target: TypeTag, line: usize) -> Result<Value, ScriptError> {
        let cast_error = |message: String| ScriptError::new(ErrorKind::Cast, line, message);

        match (self, target) {
            (Value::String(_), TypeTag::String)
            | (Value::Integer(_), TypeTag::Integer)
            | (Value::Boolean(_), TypeTag::Boolean) => Ok(self.clone()),

            (Value::Integer(n), TypeTag::String) => Ok(Value::String(n.to_string())),
            (Value::Integer(n), TypeTag::Boolean) => Ok(Value::Boolean(*n != 0)),

            (Value::Boolean(b), TypeTag::String) => Ok(Value::String(b.to_string())),
            (Value::Boolean(b), TypeTag::Integer) => {
                Ok(Value::Integer(if *b { 1 } else { 0 }))
            }

            (Value::String(s), TypeTag::Integer) => match s.trim().parse::<i64>() {
                Ok(n) => Ok(Value::Integer(n)),
                Err(_) => Err(cast_error(format!("Cannot cast '{}' to integer", s))),
            },
            (Value::String(s), TypeTag::Boolean) => match s.as_str() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(cast_error(format!("Cannot cast '{}' to boolean", s))),
            },

            (Value::Null, TypeTag::String) => Ok(Value::String("null".to_string())),

            (Value::Object(object), target) => object.cast(target).ok_or_else(|| {
                cast_error(format!(
                    "Cannot cast {} to {}",
                    object.type_name(),
                    target.name()
                ))
            }),

            (value, target) => Err(cast_error(format!(
                "Cannot cast {} to {}",
                value.type_name(),
                target.name()
            ))),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Value::Dict(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::String("hello".to_string()).to_string(), "hello");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::List(vec![Value::Integer(1), Value::Integer(2)]).to_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_cross_type_equality_is_false() {
        assert_ne!(Value::Integer(1), Value::String("1".to_string()));
        assert_ne!(Value::Boolean(false), Value::Null);
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_identity_casts() {
        let s = Value::String("x".to_string());
        assert_eq!(s.cast_to(TypeTag::String, 1).expect("cast"), s);
        let n = Value::Integer(7);
        assert_eq!(n.cast_to(TypeTag::Integer, 1).expect("cast"), n);
    }

    #[test]
    fn test_enumerated_casts() {
        assert_eq!(
            Value::Integer(5).cast_to(TypeTag::String, 1).expect("cast"),
            Value::String("5".to_string())
        );
        assert_eq!(
            Value::Integer(0).cast_to(TypeTag::Boolean, 1).expect("cast"),
            Value::Boolean(false)
        );
        assert_eq!(
            Value::Boolean(true).cast_to(TypeTag::Integer, 1).expect("cast"),
            Value::Integer(1)
        );
        assert_eq!(
            Value::String(" 42 ".to_string())
                .cast_to(TypeTag::Integer, 1)
                .expect("cast"),
            Value::Integer(42)
        );
        assert_eq!(
            Value::String("true".to_string())
                .cast_to(TypeTag::Boolean, 1)
                .expect("cast"),
            Value::Boolean(true)
        );
        assert_eq!(
            Value::Null.cast_to(TypeTag::String, 1).expect("cast"),
            Value::String("null".to_string())
        );
    }

    #[test]
    fn test_unlisted_casts_fail() {
        let err = Value::String("abc".to_string())
            .cast_to(TypeTag::Integer, 3)
            .expect_err("junk string");
        assert_eq!(err.kind, ErrorKind::Cast);
        assert_eq!(err.line, 3);

        let err = Value::Null
            .cast_to(TypeTag::Integer, 1)
            .expect_err("null to integer");
        assert!(err.message.contains("integer"));
    }

    #[test]
    fn test_native_arity() {
        assert!(NativeArity::Exact(2).accepts(2));
        assert!(!NativeArity::Exact(2).accepts(1));
        let range = NativeArity::Range {
            min: 1,
            max: Some(2),
        };
        assert!(range.accepts(1));
        assert!(range.accepts(2));
        assert!(!range.accepts(3));
        let open = NativeArity::Range { min: 0, max: None };
        assert!(open.accepts(99));
        assert_eq!(NativeArity::Exact(1).describe(), "1 arguments");
    }

    #[test]
    fn test_overload_selection_is_first_match() {
        use crate::tokenizer::Position;
        let one = FunctionDecl {
            name: "f".to_string(),
            params: vec![crate::ast::Parameter {
                name: "a".to_string(),
                optional: false,
                default: None,
                position: 0,
            }],
            body: Vec::new(),
            is_static: false,
            position: Position::new(1, 1, 0),
        };
        let mut func = ScriptFunction::new(one);
        let two = FunctionDecl {
            name: "f".to_string(),
            params: vec![
                crate::ast::Parameter {
                    name: "a".to_string(),
                    optional: false,
                    default: None,
                    position: 0,
                },
                crate::ast::Parameter {
                    name: "b".to_string(),
                    optional: false,
                    default: None,
                    position: 1,
                },
            ],
            body: Vec::new(),
            is_static: false,
            position: Position::new(2, 1, 0),
        };
        func.overloads.push(Rc::new(two));

        assert_eq!(func.select(1).expect("one arg").params.len(), 1);
        assert_eq!(func.select(2).expect("two args").params.len(), 2);
        assert!(func.select(3).is_none());
    }
}
