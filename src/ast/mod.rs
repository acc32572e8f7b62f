use crate::tokenizer::Position;

/// Binary operator tags dispatched by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Contains,
    NotContains,
    CastAs,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "is",
            BinaryOp::NotEqual => "isnot",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Contains => "in",
            BinaryOp::NotContains => "!in",
            BinaryOp::CastAs => "as",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Str(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        position: Position,
    },
    Identifier {
        name: String,
        position: Position,
    },
    /// Dotted access `base.a.b`, resolved left to right at evaluation time.
    Attribute {
        base: String,
        path: Vec<String>,
        position: Position,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        position: Position,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        position: Position,
    },
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::Literal { position, .. }
            | Expr::Identifier { position, .. }
            | Expr::Attribute { position, .. }
            | Expr::Binary { position, .. }
            | Expr::Call { position, .. } => *position,
        }
    }

    pub fn line(&self) -> usize {
        self.position().line
    }
}

/// A formal parameter. Binding is strictly positional: `position` is the
/// zero-based slot the caller's argument must occupy.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub optional: bool,
    pub default: Option<Expr>,
    pub position: usize,
}

impl Parameter {
    pub fn required(&self) -> bool {
        !self.optional && self.default.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Stmt>,
    pub is_static: bool,
    pub position: Position,
}

impl FunctionDecl {
    pub fn min_args(&self) -> usize {
        self.params.iter().filter(|p| p.required()).count()
    }

    pub fn max_args(&self) -> usize {
        self.params.len()
    }

    /// Whether a call with `count` positional arguments may dispatch to
    /// this declaration.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args() && count <= self.max_args()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseIfClause {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment {
        name: String,
        value: Expr,
        is_static: bool,
        position: Position,
    },
    CompoundAssign {
        name: String,
        op: BinaryOp,
        value: Expr,
        position: Position,
    },
    FunctionDecl {
        decl: FunctionDecl,
    },
    Expression {
        expr: Expr,
        position: Position,
    },
    If {
        condition: Expr,
        body: Vec<Stmt>,
        else_ifs: Vec<ElseIfClause>,
        else_body: Option<Vec<Stmt>>,
        position: Position,
    },
    /// `catch` is filled in by the parser; a `try` without one is rejected
    /// before execution.
    Try {
        body: Vec<Stmt>,
        catch: Option<Vec<Stmt>>,
        position: Position,
    },
    Throw {
        value: Expr,
        position: Position,
    },
    Return {
        value: Option<Expr>,
        position: Position,
    },
    Import {
        module: String,
        position: Position,
    },
}

impl Stmt {
    pub fn position(&self) -> Position {
        match self {
            Stmt::Assignment { position, .. }
            | Stmt::CompoundAssign { position, .. }
            | Stmt::Expression { position, .. }
            | Stmt::If { position, .. }
            | Stmt::Try { position, .. }
            | Stmt::Throw { position, .. }
            | Stmt::Return { position, .. }
            | Stmt::Import { position, .. } => *position,
            Stmt::FunctionDecl { decl } => decl.position,
        }
    }

    pub fn line(&self) -> usize {
        self.position().line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, optional: bool, default: Option<Expr>, position: usize) -> Parameter {
        Parameter {
            name: name.to_string(),
            optional,
            default,
            position,
        }
    }

    #[test]
    fn arity_range_counts_required_parameters() {
        let decl = FunctionDecl {
            name: "f".to_string(),
            params: vec![
                param("a", false, None, 0),
                param("b", true, None, 1),
                param(
                    "c",
                    false,
                    Some(Expr::Literal {
                        value: Literal::Integer(1),
                        position: Position::new(1, 1, 0),
                    }),
                    2,
                ),
            ],
            body: Vec::new(),
            is_static: false,
            position: Position::new(1, 1, 0),
        };
        assert_eq!(decl.min_args(), 1);
        assert_eq!(decl.max_args(), 3);
        assert!(decl.accepts(1));
        assert!(decl.accepts(3));
        assert!(!decl.accepts(0));
        assert!(!decl.accepts(4));
    }
}
