use std::fmt;
use thiserror::Error;

/// Error kinds surfaced by the interpreter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Name,
    Attribute,
    Argument,
    Static,
    Cast,
    Type,
    Execution,
    Recursion,
    Raised,
    Module,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Name => "NameError",
            ErrorKind::Attribute => "AttributeError",
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::Static => "StaticError",
            ErrorKind::Cast => "CastError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Execution => "ExecutionError",
            ErrorKind::Recursion => "RecursionError",
            ErrorKind::Raised => "RaisedError",
            ErrorKind::Module => "ModuleError",
        }
    }

    /// Only errors raised by the script's own `throw` may be intercepted by
    /// a script-level try/catch. Everything else unwinds out of the run.
    pub fn is_catchable(self) -> bool {
        matches!(self, ErrorKind::Raised)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame of the reconstructed script call stack, innermost first.
/// `function` is `None` for the top level of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function: Option<String>,
    pub line: usize,
    pub file: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[line {line}] {kind}: {message}")]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
    pub stack: Vec<StackFrame>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            stack: Vec::new(),
        }
    }

    pub fn push_frame(&mut self, function: Option<String>, line: usize, file: &str) {
        self.stack.push(StackFrame {
            function,
            line,
            file: file.to_string(),
        });
    }

    /// Human-readable rendering with the offending source line and the
    /// collected call stack, innermost frame first.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        for frame in &self.stack {
            match &frame.function {
                Some(name) => {
                    out.push_str(&format!(
                        "File {}, in function '{}', line {}\n",
                        frame.file, name, frame.line
                    ));
                }
                None => {
                    out.push_str(&format!(
                        "File {}, at top level, line {}\n",
                        frame.file, frame.line
                    ));
                }
            }
        }
        if let Some(text) = source.lines().nth(self.line.saturating_sub(1)) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(&format!("    {}\n", trimmed));
            }
        }
        out.push_str(&self.to_string());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_and_line() {
        let err = ScriptError::new(ErrorKind::Name, 3, "Variable 'x' not found");
        assert_eq!(err.to_string(), "[line 3] NameError: Variable 'x' not found");
    }

    #[test]
    fn only_raised_errors_are_catchable() {
        assert!(ErrorKind::Raised.is_catchable());
        assert!(!ErrorKind::Recursion.is_catchable());
        assert!(!ErrorKind::Syntax.is_catchable());
        assert!(!ErrorKind::Name.is_catchable());
    }

    #[test]
    fn render_includes_source_line_and_frames() {
        let mut err = ScriptError::new(ErrorKind::Raised, 2, "boom");
        err.push_frame(Some("f".to_string()), 2, "<test>");
        err.push_frame(None, 4, "<test>");
        let rendered = err.render("x = 1\nthrow \"boom\"\n");
        assert!(rendered.contains("in function 'f'"));
        assert!(rendered.contains("at top level"));
        assert!(rendered.contains("throw \"boom\""));
        assert!(rendered.contains("RaisedError: boom"));
    }
}
