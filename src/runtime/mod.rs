//=============================================
// src/runtime/mod.rs
//=============================================
// Author: MambaScript Contributors
// License: MIT (see LICENSE)
// Goal: MambaScript runtime evaluator
// Objective: Execute parsed statement lists against a stack of scoped
//            namespaces, bridging script values and native callables
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::ast::{BinaryOp, Expr, FunctionDecl, Literal, Stmt};
use crate::errors::{ErrorKind, ScriptError};
use crate::modules;
use crate::parser::Parser;
use crate::scope::Scope;
use crate::tokenizer::Tokenizer;
use crate::value::{ScriptFunction, Value};

//=============================================
//            Section 2: Run Configuration
//=============================================

/// Interpreter options supplied by the embedding host.
#[derive(Debug, Clone)]
pub struct Options {
    /// Block stdlib modules that touch the filesystem or the network.
    pub safe_mode: bool,
    /// Maximum nested script-function call depth.
    pub max_call_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            safe_mode: false,
            max_call_depth: 100,
        }
    }
}

/// Lifecycle of a single `run` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Tokenizing,
    Parsing,
    Executing,
    Completed,
    Failed,
}

/// Host-clonable cancellation handle, checked at every statement boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Explicit control-flow result returned by statement execution. `Return`
/// propagates through nested if-bodies up to the enclosing call.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

//=============================================
//            Section 3: Runtime State
//=============================================

/// One interpreter instance: a scope stack, the original source for error
/// rendering, and the shared resources stdlib modules draw on. A Runtime
/// executes exactly one script; its root scope stays readable afterwards.
#[derive(Debug)]
pub struct Runtime {
    scopes: Vec<Scope>,
    file: String,
    source: String,
    options: Options,
    state: RunState,
    call_stack: Vec<String>,
    cancel: CancelToken,
    http_agent: OnceCell<ureq::Agent>,
}

impl Runtime {
    pub fn new(file: impl Into<String>) -> Self {
        Self::with_options(file, Options::default())
    }

    pub fn with_options(file: impl Into<String>, options: Options) -> Self {
        Self {
            scopes: Vec::new(),
            file: file.into(),
            source: String::new(),
            options,
            state: RunState::Idle,
            call_stack: Vec::new(),
            cancel: CancelToken::new(),
            http_agent: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The blocking HTTP agent shared by the `requests` module, created on
    /// first use and dropped with the Runtime.
    pub fn http_agent(&self) -> &ureq::Agent {
        self.http_agent.get_or_init(ureq::agent)
    }

    /// Read a binding from the populated namespace, innermost scope first.
    pub fn get(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(binding) = scope.get(name) {
                return Some(binding.value.clone());
            }
        }
        None
    }

    /// Names bound in the root namespace, in insertion order.
    pub fn names(&self) -> Vec<String> {
        match self.scopes.first() {
            Some(scope) => scope.names().map(str::to_string).collect(),
            None => Vec::new(),
        }
    }

    //=============================================
    //            Section 4: Run Pipeline
    //=============================================

    /// Tokenize, parse, and execute `source`. Injected host variables are
    /// bound statically into the initial scope before execution.
    pub fn run<I>(&mut self, source: &str, injected: I) -> Result<(), ScriptError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if !self.scopes.is_empty() {
            return Err(ScriptError::new(
                ErrorKind::Execution,
                0,
                "Runtime has already executed a script",
            ));
        }

        self.source = source.to_string();

        self.state = RunState::Tokenizing;
        let tokens = match Tokenizer::new(source).tokenize() {
            Ok(tokens) => tokens,
            Err(err) => {
                self.state = RunState::Failed;
                return Err(err);
            }
        };
        log::debug!("tokenized {} tokens from {}", tokens.len(), self.file);

        self.state = RunState::Parsing;
        let program = match Parser::new(tokens).parse() {
            Ok(program) => program,
            Err(err) => {
                self.state = RunState::Failed;
                return Err(err);
            }
        };
        log::debug!("parsed {} top-level statements", program.len());

        self.state = RunState::Executing;
        self.scopes.push(self.bootstrap_scope(injected));

        match self.exec_block(&program) {
            Ok(_) => {
                self.state = RunState::Completed;
                Ok(())
            }
            Err(mut err) => {
                self.state = RunState::Failed;
                err.push_frame(None, err.line, &self.file);
                Err(err)
            }
        }
    }

    /// The initial scope: builtins, the boolean/null constants, and every
    /// injected host value, all bound static.
    fn bootstrap_scope<I>(&self, injected: I) -> Scope
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut scope = Scope::new();
        scope.force_set("true", Value::Boolean(true), true);
        scope.force_set("false", Value::Boolean(false), true);
        scope.force_set("null", Value::Null, true);
        for (name, value) in modules::builtin_exports() {
            scope.force_set(&name, value, true);
        }
        for (name, value) in injected {
            scope.force_set(&name, value, true);
        }
        scope
    }

    //=============================================
    //            Section 5: Statement Execution
    //=============================================

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, ScriptError> {
        for stmt in stmts {
            if self.cancel.is_cancelled() {
                return Err(ScriptError::new(
                    ErrorKind::Execution,
                    stmt.line(),
                    "Execution cancelled by the host",
                ));
            }
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, ScriptError> {
        match stmt {
            Stmt::Assignment {
                name,
                value,
                is_static,
                position,
            } => {
                let value = self.eval_expr(value)?;
                self.set_variable(name, value, *is_static, position.line)?;
                Ok(Flow::Normal)
            }

            Stmt::CompoundAssign {
                name,
                op,
                value,
                position,
            } => {
                let line = position.line;
                let rhs = self.eval_expr(value)?;
                let current = self.get_variable(name, line)?;
                let next = binary_op(*op, current, rhs, line)?;
                self.rebind_existing(name, next, line)?;
                Ok(Flow::Normal)
            }

            Stmt::FunctionDecl { decl } => {
                self.define_function(decl)?;
                Ok(Flow::Normal)
            }

            Stmt::Expression { expr, .. } => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::If {
                condition,
                body,
                else_ifs,
                else_body,
                ..
            } => {
                // If-bodies share the enclosing scope; no scope is pushed.
                if self.eval_condition(condition)? {
                    return self.exec_block(body);
                }
                for clause in else_ifs {
                    if self.eval_condition(&clause.condition)? {
                        return self.exec_block(&clause.body);
                    }
                }
                if let Some(body) = else_body {
                    return self.exec_block(body);
                }
                Ok(Flow::Normal)
            }

            Stmt::Try {
                body,
                catch,
                position,
            } => match self.exec_block(body) {
                Ok(flow) => Ok(flow),
                Err(err) if err.kind.is_catchable() => {
                    let catch = match catch {
                        Some(catch) => catch,
                        None => return Err(err),
                    };
                    let line = position.line;
                    self.innermost_scope(line)?.force_set(
                        "error",
                        Value::String(err.message.clone()),
                        true,
                    );
                    let result = self.exec_block(catch);
                    if matches!(&result, Ok(Flow::Normal)) {
                        self.innermost_scope(line)?.delete("error");
                    }
                    result
                }
                Err(err) => Err(err),
            },

            Stmt::Throw { value, position } => {
                let message = self.eval_expr(value)?;
                match message {
                    Value::String(text) => {
                        Err(ScriptError::new(ErrorKind::Raised, position.line, text))
                    }
                    other => Err(ScriptError::new(
                        ErrorKind::Type,
                        position.line,
                        format!("'throw' requires a string message, got {}", other.type_name()),
                    )),
                }
            }

            Stmt::Return { value, position } => {
                if self.call_stack.is_empty() {
                    return Err(ScriptError::new(
                        ErrorKind::Execution,
                        position.line,
                        "'return' outside of a function",
                    ));
                }
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Import { module, position } => {
                let line = position.line;
                let resolved = modules::resolve(module, self.options.safe_mode, line)?;
                log::debug!("imported module '{}'", module);
                self.set_variable(module, resolved, true, line)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn eval_condition(&mut self, condition: &Expr) -> Result<bool, ScriptError> {
        match self.eval_expr(condition)? {
            Value::Boolean(passing) => Ok(passing),
            other => Err(ScriptError::new(
                ErrorKind::Type,
                condition.line(),
                format!(
                    "The 'if' condition must produce a boolean, got {}",
                    other.type_name()
                ),
            )),
        }
    }

    /// Register a function declaration. Declarations sharing a name in the
    /// same scope accumulate as overloads on one Function value.
    fn define_function(&mut self, decl: &FunctionDecl) -> Result<(), ScriptError> {
        let line = decl.position.line;
        let scope = self.innermost_scope(line)?;

        let existing = scope.get(&decl.name).map(|binding| {
            let function = match &binding.value {
                Value::Function(function) => Some(function.clone()),
                _ => None,
            };
            (function, binding.is_static)
        });

        match existing {
            Some((Some(function), was_static)) => {
                let mut merged = (*function).clone();
                merged.overloads.push(Rc::new(decl.clone()));
                let scope = self.innermost_scope(line)?;
                scope.force_set(
                    &decl.name,
                    Value::Function(Rc::new(merged)),
                    was_static || decl.is_static,
                );
                Ok(())
            }
            Some((None, true)) => Err(ScriptError::new(
                ErrorKind::Static,
                line,
                format!("Variable '{}' is static and cannot be changed", decl.name),
            )),
            _ => {
                let value = Value::Function(Rc::new(ScriptFunction::new(decl.clone())));
                let is_static = decl.is_static;
                let name = decl.name.clone();
                self.innermost_scope(line)?
                    .set(&name, value, is_static, line)
            }
        }
    }

    //=============================================
    //            Section 6: Scope Access
    //=============================================

    fn innermost_scope(&mut self, line: usize) -> Result<&mut Scope, ScriptError> {
        match self.scopes.last_mut() {
            Some(scope) => Ok(scope),
            None => Err(ScriptError::new(
                ErrorKind::Execution,
                line,
                "No active scope",
            )),
        }
    }

    fn get_variable(&self, name: &str, line: usize) -> Result<Value, ScriptError> {
        for scope in self.scopes.iter().rev() {
            if let Some(binding) = scope.get(name) {
                return Ok(binding.value.clone());
            }
        }
        Err(ScriptError::new(
            ErrorKind::Name,
            line,
            format!("Variable '{}' not found", name),
        ))
    }

    fn set_variable(
        &mut self,
        name: &str,
        value: Value,
        is_static: bool,
        line: usize,
    ) -> Result<(), ScriptError> {
        self.innermost_scope(line)?.set(name, value, is_static, line)
    }

    /// Rewrite an existing binding wherever in the chain it lives. Used by
    /// compound assignment, which never creates new bindings.
    fn rebind_existing(
        &mut self,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<(), ScriptError> {
        for scope in self.scopes.iter_mut().rev() {
            if scope.contains(name) {
                return scope.set(name, value, false, line);
            }
        }
        Err(ScriptError::new(
            ErrorKind::Name,
            line,
            format!("Variable '{}' not found", name),
        ))
    }

    //=============================================
    //            Section 7: Expression Evaluation
    //=============================================

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Integer(n) => Value::Integer(*n),
                Literal::Str(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
            }),

            Expr::Identifier { name, position } => self.get_variable(name, position.line),

            Expr::Attribute {
                base,
                path,
                position,
            } => self.resolve_attribute(base, path, position.line),

            Expr::Binary {
                left,
                op: BinaryOp::CastAs,
                right,
                position,
            } => {
                let value = self.eval_expr(left)?;
                let target = self.eval_expr(right)?;
                match target {
                    Value::Type(tag) => value.cast_to(tag, position.line),
                    other => Err(ScriptError::new(
                        ErrorKind::Cast,
                        position.line,
                        format!("Cast target must be a type, got {}", other.type_name()),
                    )),
                }
            }

            Expr::Binary {
                left,
                op,
                right,
                position,
            } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                binary_op(*op, left, right, position.line)
            }

            Expr::Call {
                callee,
                args,
                position,
            } => {
                let function = match callee.as_ref() {
                    Expr::Identifier { name, position } => self.get_variable(name, position.line)?,
                    Expr::Attribute {
                        base,
                        path,
                        position,
                    } => self.resolve_attribute(base, path, position.line)?,
                    other => {
                        return Err(ScriptError::new(
                            ErrorKind::Execution,
                            position.line,
                            format!("Invalid call target: {:?}", other),
                        ));
                    }
                };

                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.eval_expr(arg)?);
                }

                self.call_value(function, evaluated, position.line)
            }
        }
    }

    fn resolve_attribute(
        &mut self,
        base: &str,
        path: &[String],
        line: usize,
    ) -> Result<Value, ScriptError> {
        let mut value = self.get_variable(base, line)?;
        let mut walked = base.to_string();

        for segment in path {
            if segment.starts_with('_') {
                return Err(ScriptError::new(
                    ErrorKind::Attribute,
                    line,
                    format!(
                        "Underscored attributes are private and cannot be accessed ({}.{})",
                        walked, segment
                    ),
                ));
            }
            let next = attribute_of(&value, segment);
            match next {
                Some(next) => {
                    walked.push('.');
                    walked.push_str(segment);
                    value = next;
                }
                None => {
                    return Err(ScriptError::new(
                        ErrorKind::Attribute,
                        line,
                        format!("'{}' has no attribute '{}'", value.type_name(), segment),
                    ));
                }
            }
        }

        Ok(value)
    }

    //=============================================
    //            Section 8: Call Dispatch
    //=============================================

    /// Invoke a resolved callee. Script functions dispatch through
    /// overload-arity matching into a fresh scope; natives and type objects
    /// are invoked directly.
    pub fn call_value(
        &mut self,
        function: Value,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, ScriptError> {
        match function {
            Value::Function(function) => self.call_script_function(&function, args, line),

            Value::Native(native) => {
                if !native.arity.accepts(args.len()) {
                    return Err(ScriptError::new(
                        ErrorKind::Argument,
                        line,
                        format!(
                            "Function '{}' expects {}, got {}",
                            native.name,
                            native.arity.describe(),
                            args.len()
                        ),
                    ));
                }
                (native.func)(line, self, &args)
            }

            Value::Type(tag) => {
                if args.len() != 1 {
                    return Err(ScriptError::new(
                        ErrorKind::Argument,
                        line,
                        format!("'{}' expects 1 argument, got {}", tag.name(), args.len()),
                    ));
                }
                args[0].cast_to(tag, line)
            }

            Value::Object(object) => object.call(line, self, &args),

            other => Err(ScriptError::new(
                ErrorKind::Execution,
                line,
                format!("Value of type '{}' is not callable", other.type_name()),
            )),
        }
    }

    fn call_script_function(
        &mut self,
        function: &ScriptFunction,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, ScriptError> {
        if self.call_stack.len() >= self.options.max_call_depth {
            return Err(ScriptError::new(
                ErrorKind::Recursion,
                line,
                format!(
                    "Maximum call depth of {} exceeded",
                    self.options.max_call_depth
                ),
            ));
        }

        let decl = match function.select(args.len()) {
            Some(decl) => decl.clone(),
            None => {
                return Err(ScriptError::new(
                    ErrorKind::Execution,
                    line,
                    format!(
                        "Function '{}' could not take such arguments ({} given)",
                        function.name,
                        args.len()
                    ),
                ));
            }
        };

        self.scopes.push(Scope::new());
        self.call_stack.push(function.name.clone());

        let result = self.bind_arguments(&decl, args).and_then(|_| {
            match self.exec_block(&decl.body) {
                Ok(Flow::Return(value)) => Ok(value),
                Ok(Flow::Normal) => Ok(Value::Null),
                Err(err) => Err(err),
            }
        });

        self.scopes.pop();
        self.call_stack.pop();

        result.map_err(|mut err| {
            err.push_frame(Some(function.name.clone()), line, &self.file);
            err
        })
    }

    /// Positional argument binding into the freshly pushed call scope.
    /// Primitive values are cloned on entry; shared values stay shared.
    fn bind_arguments(
        &mut self,
        decl: &FunctionDecl,
        args: Vec<Value>,
    ) -> Result<(), ScriptError> {
        let line = decl.position.line;
        for param in &decl.params {
            match args.get(param.position) {
                Some(value) => {
                    let value = value.clone();
                    self.innermost_scope(line)?
                        .force_set(&param.name, value, false);
                }
                None => match &param.default {
                    Some(default) => {
                        let value = self.eval_expr(default)?;
                        self.innermost_scope(line)?
                            .force_set(&param.name, value, false);
                    }
                    None if param.optional => {
                        self.innermost_scope(line)?
                            .force_set(&param.name, Value::Null, false);
                    }
                    None => {
                        return Err(ScriptError::new(
                            ErrorKind::Argument,
                            line,
                            format!("No value passed for argument '{}'", param.name),
                        ));
                    }
                },
            }
        }
        Ok(())
    }
}

//=============================================
//            Section 9: Operators
//=============================================

fn attribute_of(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Module(module) => module.exports.get(name).cloned(),
        Value::Dict(map) => map.get(name).cloned(),
        Value::Object(object) => object.attr(name),
        _ => None,
    }
}

/// Floor division, matching the semantics scripts expect: the quotient is
/// rounded toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let quotient = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// Modulo paired with `floor_div`: the result takes the divisor's sign.
fn floor_mod(a: i64, b: i64) -> i64 {
    a - floor_div(a, b) * b
}

pub(crate) fn binary_op(
    op: BinaryOp,
    left: Value,
    right: Value,
    line: usize,
) -> Result<Value, ScriptError> {
    use Value::*;

    let type_error = |message: std::string::String| ScriptError::new(ErrorKind::Type, line, message);
    let exec_error = |message: &str| ScriptError::new(ErrorKind::Execution, line, message);

    match op {
        BinaryOp::Add => match (left, right) {
            (Integer(a), Integer(b)) => Ok(Integer(a + b)),
            (String(a), String(b)) => Ok(String(a + &b)),
            (a, b) => Err(type_error(format!(
                "Cannot add {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        BinaryOp::Subtract => match (left, right) {
            (Integer(a), Integer(b)) => Ok(Integer(a - b)),
            (a, b) => Err(type_error(format!(
                "Cannot subtract {} from {}",
                b.type_name(),
                a.type_name()
            ))),
        },
        BinaryOp::Multiply => match (left, right) {
            (Integer(a), Integer(b)) => Ok(Integer(a * b)),
            (String(s), Integer(n)) => Ok(String(s.repeat(n.max(0) as usize))),
            (a, b) => Err(type_error(format!(
                "Cannot multiply {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        BinaryOp::Divide => match (left, right) {
            (Integer(_), Integer(0)) => Err(exec_error("Division by zero")),
            (Integer(a), Integer(b)) => Ok(Integer(floor_div(a, b))),
            (a, b) => Err(type_error(format!(
                "Cannot divide {} by {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        BinaryOp::Modulo => match (left, right) {
            (Integer(_), Integer(0)) => Err(exec_error("Modulo by zero")),
            (Integer(a), Integer(b)) => Ok(Integer(floor_mod(a, b))),
            (a, b) => Err(type_error(format!(
                "Cannot take {} modulo {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        BinaryOp::Equal => Ok(Boolean(left == right)),
        BinaryOp::NotEqual => Ok(Boolean(left != right)),
        BinaryOp::Greater => match (left, right) {
            (Integer(a), Integer(b)) => Ok(Boolean(a > b)),
            (String(a), String(b)) => Ok(Boolean(a > b)),
            (a, b) => Err(type_error(format!(
                "Cannot compare {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        BinaryOp::GreaterEqual => match (left, right) {
            (Integer(a), Integer(b)) => Ok(Boolean(a >= b)),
            (String(a), String(b)) => Ok(Boolean(a >= b)),
            (a, b) => Err(type_error(format!(
                "Cannot compare {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        BinaryOp::Less => match (left, right) {
            (Integer(a), Integer(b)) => Ok(Boolean(a < b)),
            (String(a), String(b)) => Ok(Boolean(a < b)),
            (a, b) => Err(type_error(format!(
                "Cannot compare {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        BinaryOp::LessEqual => match (left, right) {
            (Integer(a), Integer(b)) => Ok(Boolean(a <= b)),
            (String(a), String(b)) => Ok(Boolean(a <= b)),
            (a, b) => Err(type_error(format!(
                "Cannot compare {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        },
        BinaryOp::Contains | BinaryOp::NotContains => {
            let contained = match (&left, &right) {
                (String(needle), String(haystack)) => haystack.contains(needle.as_str()),
                (item, List(items)) => items.contains(item),
                (String(key), Dict(map)) => map.contains_key(key.as_str()),
                (a, b) => {
                    return Err(type_error(format!(
                        "Cannot test {} membership in {}",
                        a.type_name(),
                        b.type_name()
                    )));
                }
            };
            Ok(Boolean(if op == BinaryOp::Contains {
                contained
            } else {
                !contained
            }))
        }
        BinaryOp::CastAs => Err(exec_error("Unknown operator")),
    }
}

//=============================================
//            Section 10: Tests
//=============================================
