use crate::ast::{
    BinaryOp, ElseIfClause, Expr, FunctionDecl, Literal, Parameter, Stmt,
};
use crate::errors::{ErrorKind, ScriptError};
use crate::tokenizer::{Position, Token, TokenKind};

/// A token stream after block grouping: plain tokens interleaved with
/// opaque brace-delimited groups.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenTree {
    Tok(Token),
    Block(BlockGroup),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockGroup {
    pub items: Vec<TokenTree>,
    pub position: Position,
}

/// Parser for MambaScript token streams.
///
/// Works in two passes: brace-depth block grouping first, then statement
/// classification over lines split at end-of-line markers.
pub struct Parser {
    tokens: Vec<Token>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn parse(self) -> Result<Vec<Stmt>, ScriptError> {
        let grouped = group_blocks(self.tokens)?;
        parse_statements(&grouped)
    }
}

fn syntax_error(line: usize, message: impl Into<String>) -> ScriptError {
    ScriptError::new(ErrorKind::Syntax, line, message)
}

fn tree_position(tree: &TokenTree) -> Position {
    match tree {
        TokenTree::Tok(token) => token.position,
        TokenTree::Block(block) => block.position,
    }
}

fn tree_describe(tree: &TokenTree) -> String {
    match tree {
        TokenTree::Tok(token) => token.kind.to_string(),
        TokenTree::Block(_) => "{".to_string(),
    }
}

fn tok_kind(tree: &TokenTree) -> Option<&TokenKind> {
    match tree {
        TokenTree::Tok(token) => Some(&token.kind),
        TokenTree::Block(_) => None,
    }
}

/// Pass 1: group brace-delimited token runs into opaque blocks. An Eol is
/// synthesized after every closed block so that `}` always terminates a
/// statement line.
fn group_blocks(tokens: Vec<Token>) -> Result<Vec<TokenTree>, ScriptError> {
    let mut frames: Vec<(Vec<TokenTree>, Position)> = Vec::new();
    let mut current: Vec<TokenTree> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::BlockOpen => {
                frames.push((std::mem::take(&mut current), token.position));
            }
            TokenKind::BlockClose => match frames.pop() {
                Some((parent, open_position)) => {
                    let block = BlockGroup {
                        items: std::mem::replace(&mut current, parent),
                        position: open_position,
                    };
                    current.push(TokenTree::Block(block));
                    current.push(TokenTree::Tok(Token::new(TokenKind::Eol, token.position)));
                }
                None => {
                    return Err(syntax_error(token.position.line, "Unexpected '}'"));
                }
            },
            _ => current.push(TokenTree::Tok(token)),
        }
    }

    if let Some((_, open_position)) = frames.last() {
        return Err(syntax_error(open_position.line, "Unclosed '{'"));
    }

    Ok(current)
}

fn split_lines(items: &[TokenTree]) -> Vec<&[TokenTree]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (index, tree) in items.iter().enumerate() {
        if matches!(tok_kind(tree), Some(TokenKind::Eol)) {
            lines.push(&items[start..index]);
            start = index + 1;
        }
    }
    lines.push(&items[start..]);
    lines
}

fn split_top_level_commas(items: &[TokenTree]) -> Vec<&[TokenTree]> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, tree) in items.iter().enumerate() {
        match tok_kind(tree) {
            Some(TokenKind::ParenOpen) => depth += 1,
            Some(TokenKind::ParenClose) => depth = depth.saturating_sub(1),
            Some(TokenKind::Comma) if depth == 0 => {
                groups.push(&items[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    groups.push(&items[start..]);
    groups
}

fn find_matching_paren(items: &[TokenTree], open: usize) -> Result<usize, ScriptError> {
    let mut depth = 1usize;
    for (index, tree) in items.iter().enumerate().skip(open + 1) {
        match tok_kind(tree) {
            Some(TokenKind::ParenOpen) => depth += 1,
            Some(TokenKind::ParenClose) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(index);
                }
            }
            _ => {}
        }
    }
    Err(syntax_error(
        tree_position(&items[open]).line,
        "Unclosed '('",
    ))
}

/// Pass 2: split the grouped stream into lines and classify each one by its
/// leading token kinds.
pub(crate) fn parse_statements(items: &[TokenTree]) -> Result<Vec<Stmt>, ScriptError> {
    let mut stmts: Vec<Stmt> = Vec::new();

    for line in split_lines(items) {
        if line.is_empty() {
            continue;
        }
        let position = tree_position(&line[0]);
        let first = tok_kind(&line[0]);

        match first {
            Some(TokenKind::Static) => match line.get(1).and_then(tok_kind) {
                Some(TokenKind::Func) => {
                    stmts.push(parse_function(&line[1..], true)?);
                }
                Some(TokenKind::Identifier(_)) => {
                    stmts.push(parse_identifier_line(&line[1..], true)?);
                }
                _ => {
                    return Err(syntax_error(
                        position.line,
                        "Expected 'func' or a variable name after 'static'",
                    ));
                }
            },
            Some(TokenKind::Func) => stmts.push(parse_function(line, false)?),
            Some(TokenKind::If) => {
                let (condition, body) = parse_conditional(line)?;
                stmts.push(Stmt::If {
                    condition,
                    body,
                    else_ifs: Vec::new(),
                    else_body: None,
                    position,
                });
            }
            Some(TokenKind::ElseIf) => {
                let (condition, body) = parse_conditional(line)?;
                match stmts.last_mut() {
                    Some(Stmt::If {
                        else_ifs,
                        else_body: None,
                        ..
                    }) => else_ifs.push(ElseIfClause {
                        condition,
                        body,
                        position,
                    }),
                    _ => return Err(syntax_error(position.line, "Unexpected 'else if'")),
                }
            }
            Some(TokenKind::Else) => {
                let body = parse_bare_block(line, "else")?;
                match stmts.last_mut() {
                    Some(Stmt::If {
                        else_body: else_body @ None,
                        ..
                    }) => *else_body = Some(body),
                    _ => return Err(syntax_error(position.line, "Unexpected 'else'")),
                }
            }
            Some(TokenKind::Try) => {
                let body = parse_bare_block(line, "try")?;
                stmts.push(Stmt::Try {
                    body,
                    catch: None,
                    position,
                });
            }
            Some(TokenKind::Catch) => {
                let body = parse_bare_block(line, "catch")?;
                match stmts.last_mut() {
                    Some(Stmt::Try { catch: catch @ None, .. }) => *catch = Some(body),
                    _ => return Err(syntax_error(position.line, "Unexpected 'catch'")),
                }
            }
            Some(TokenKind::Throw) => {
                if line.len() < 2 {
                    return Err(syntax_error(position.line, "'throw' requires a value"));
                }
                let value = parse_expression(&line[1..])?;
                stmts.push(Stmt::Throw { value, position });
            }
            Some(TokenKind::Return) => {
                let value = if line.len() == 1 {
                    None
                } else {
                    Some(parse_expression(&line[1..])?)
                };
                stmts.push(Stmt::Return { value, position });
            }
            Some(TokenKind::Import) => {
                let module = match (line.get(1).and_then(tok_kind), line.len()) {
                    (Some(TokenKind::Identifier(name)), 2) => name.clone(),
                    _ => {
                        return Err(syntax_error(
                            position.line,
                            "'import' expects a module name",
                        ));
                    }
                };
                stmts.push(Stmt::Import { module, position });
            }
            Some(TokenKind::Identifier(_)) => {
                stmts.push(parse_identifier_line(line, false)?);
            }
            _ => {
                return Err(syntax_error(
                    position.line,
                    format!("Invalid Syntax near '{}'", tree_describe(&line[0])),
                ));
            }
        }
    }

    for stmt in &stmts {
        if let Stmt::Try {
            catch: None,
            position,
            ..
        } = stmt
        {
            return Err(syntax_error(
                position.line,
                "'try' block without a 'catch' block",
            ));
        }
    }

    Ok(stmts)
}

/// A line beginning with an identifier: assignment, compound assignment,
/// or an expression statement carrying a call pattern.
fn parse_identifier_line(line: &[TokenTree], is_static: bool) -> Result<Stmt, ScriptError> {
    let position = tree_position(&line[0]);
    let name = match tok_kind(&line[0]) {
        Some(TokenKind::Identifier(name)) => name.clone(),
        _ => return Err(syntax_error(position.line, "Expected a variable name")),
    };

    let compound = |op: BinaryOp| -> Result<Stmt, ScriptError> {
        if line.len() < 3 {
            return Err(syntax_error(
                position.line,
                format!("Expected a value after '{}='", op.symbol()),
            ));
        }
        Ok(Stmt::CompoundAssign {
            name: name.clone(),
            op,
            value: parse_expression(&line[2..])?,
            position,
        })
    };

    match line.get(1).and_then(tok_kind) {
        Some(TokenKind::Assign) => {
            if line.len() < 3 {
                return Err(syntax_error(position.line, "Expected a value after '='"));
            }
            Ok(Stmt::Assignment {
                name,
                value: parse_expression(&line[2..])?,
                is_static,
                position,
            })
        }
        Some(TokenKind::PlusAssign) => compound(BinaryOp::Add),
        Some(TokenKind::MinusAssign) => compound(BinaryOp::Subtract),
        Some(TokenKind::TimesAssign) => compound(BinaryOp::Multiply),
        Some(TokenKind::DivideAssign) => compound(BinaryOp::Divide),
        None => Err(syntax_error(
            position.line,
            "Declaring a variable requires an assignment",
        )),
        _ => {
            if is_static {
                return Err(syntax_error(
                    position.line,
                    "'static' requires an assignment",
                ));
            }
            let expr = parse_expression(line)?;
            match &expr {
                Expr::Call { .. } | Expr::Attribute { .. } => {
                    Ok(Stmt::Expression { expr, position })
                }
                _ => Err(syntax_error(
                    position.line,
                    format!("Invalid Syntax near '{}'", tree_describe(&line[0])),
                )),
            }
        }
    }
}

/// `func name(args) { body }`, with the leading `func` at index 0.
fn parse_function(line: &[TokenTree], is_static: bool) -> Result<Stmt, ScriptError> {
    let position = tree_position(&line[0]);
    let name = match line.get(1).and_then(tok_kind) {
        Some(TokenKind::Identifier(name)) => name.clone(),
        _ => return Err(syntax_error(position.line, "Expected a function name")),
    };
    if !matches!(line.get(2).and_then(tok_kind), Some(TokenKind::ParenOpen)) {
        return Err(syntax_error(
            position.line,
            "Expected '(' after the function name",
        ));
    }

    let close = find_matching_paren(line, 2)?;
    let params = parse_parameters(&line[3..close])?;

    let body = match line.get(close + 1) {
        Some(TokenTree::Block(block)) => parse_statements(&block.items)?,
        _ => {
            return Err(syntax_error(
                position.line,
                "Expected '{' to open the function body",
            ));
        }
    };
    if line.len() > close + 2 {
        return Err(syntax_error(
            position.line,
            "Unexpected tokens after the function body",
        ));
    }

    Ok(Stmt::FunctionDecl {
        decl: FunctionDecl {
            name,
            params,
            body,
            is_static,
            position,
        },
    })
}

fn parse_parameters(items: &[TokenTree]) -> Result<Vec<Parameter>, ScriptError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut params = Vec::new();
    for (index, group) in split_top_level_commas(items).into_iter().enumerate() {
        if group.is_empty() {
            let line = tree_position(&items[0]).line;
            return Err(syntax_error(line, "Invalid comma in parameter list"));
        }
        let line = tree_position(&group[0]).line;

        let mut cursor = 0;
        let optional = matches!(tok_kind(&group[cursor]), Some(TokenKind::Qmark));
        if optional {
            cursor += 1;
        }

        let name = match group.get(cursor).and_then(tok_kind) {
            Some(TokenKind::Identifier(name)) => name.clone(),
            _ => return Err(syntax_error(line, "Expected a parameter name")),
        };
        cursor += 1;

        let default = match group.get(cursor).and_then(tok_kind) {
            Some(TokenKind::Assign) => {
                if group.len() <= cursor + 1 {
                    return Err(syntax_error(
                        line,
                        format!("Expected a default value for parameter '{}'", name),
                    ));
                }
                Some(parse_expression(&group[cursor + 1..])?)
            }
            Some(_) => {
                return Err(syntax_error(
                    line,
                    format!("Unexpected token after parameter '{}'", name),
                ));
            }
            None => None,
        };

        params.push(Parameter {
            name,
            optional,
            default,
            position: index,
        });
    }

    Ok(params)
}

/// `if (cond) { body }` / `else if (cond) { body }`. The condition must be
/// exactly one parenthesized comparison expression.
fn parse_conditional(line: &[TokenTree]) -> Result<(Expr, Vec<Stmt>), ScriptError> {
    let position = tree_position(&line[0]);
    if !matches!(line.get(1).and_then(tok_kind), Some(TokenKind::ParenOpen)) {
        return Err(syntax_error(position.line, "Expected '(' after 'if'"));
    }

    let close = find_matching_paren(line, 1)?;
    let inner = &line[2..close];
    if inner.is_empty() {
        return Err(syntax_error(position.line, "'if' requires a condition"));
    }
    let groups = split_top_level_commas(inner);
    if groups.len() != 1 {
        return Err(syntax_error(
            position.line,
            format!("'if' expects exactly one condition, got {}", groups.len()),
        ));
    }

    let condition = parse_expression(groups[0])?;
    if !matches!(condition, Expr::Binary { .. }) {
        return Err(syntax_error(
            position.line,
            "'if' condition must be a comparison",
        ));
    }

    let body = match line.get(close + 1) {
        Some(TokenTree::Block(block)) => parse_statements(&block.items)?,
        _ => {
            return Err(syntax_error(
                position.line,
                "Expected '{' after the condition",
            ));
        }
    };
    if line.len() > close + 2 {
        return Err(syntax_error(
            position.line,
            "Unexpected tokens after the block",
        ));
    }

    Ok((condition, body))
}

/// `try { body }` / `catch { body }` / `else { body }` — a keyword followed
/// by a single block and nothing else.
fn parse_bare_block(line: &[TokenTree], keyword: &str) -> Result<Vec<Stmt>, ScriptError> {
    let position = tree_position(&line[0]);
    match (line.get(1), line.len()) {
        (Some(TokenTree::Block(block)), 2) => parse_statements(&block.items),
        _ => Err(syntax_error(
            position.line,
            format!("Expected '{{' after '{}'", keyword),
        )),
    }
}

struct Cursor<'a> {
    items: &'a [TokenTree],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a TokenTree> {
        self.items.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().and_then(tok_kind)
    }
}

/// Parse a flat token run into a single expression tree.
pub(crate) fn parse_expression(items: &[TokenTree]) -> Result<Expr, ScriptError> {
    if items.is_empty() {
        return Err(syntax_error(0, "Expected an expression"));
    }
    let mut cursor = Cursor { items, pos: 0 };
    let expr = parse_expr_chain(&mut cursor)?;
    if let Some(tree) = cursor.peek() {
        return Err(syntax_error(
            tree_position(tree).line,
            format!("Unexpected '{}' after expression", tree_describe(tree)),
        ));
    }
    Ok(expr)
}

/// Right-recursive chain parsing: consume the left operand, then treat the
/// entire remainder after a binary operator as the right operand. Chained
/// operators therefore associate to the right.
fn parse_expr_chain(cursor: &mut Cursor<'_>) -> Result<Expr, ScriptError> {
    let left = parse_operand(cursor)?;

    if let Some(op) = cursor.peek_kind().and_then(binary_op_for) {
        let position = cursor
            .peek()
            .map(tree_position)
            .unwrap_or_else(|| left.position());
        cursor.pos += 1;
        let right = parse_expr_chain(cursor)?;
        return Ok(Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            position,
        });
    }

    Ok(left)
}

fn binary_op_for(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Subtract),
        TokenKind::Multiply => Some(BinaryOp::Multiply),
        TokenKind::Divide => Some(BinaryOp::Divide),
        TokenKind::Modulus => Some(BinaryOp::Modulo),
        TokenKind::Equal => Some(BinaryOp::Equal),
        TokenKind::NotEqual => Some(BinaryOp::NotEqual),
        TokenKind::Greater => Some(BinaryOp::Greater),
        TokenKind::GreaterEqual => Some(BinaryOp::GreaterEqual),
        TokenKind::Less => Some(BinaryOp::Less),
        TokenKind::LessEqual => Some(BinaryOp::LessEqual),
        TokenKind::In => Some(BinaryOp::Contains),
        TokenKind::NotIn => Some(BinaryOp::NotContains),
        _ => None,
    }
}

fn parse_operand(cursor: &mut Cursor<'_>) -> Result<Expr, ScriptError> {
    let tree = match cursor.peek() {
        Some(tree) => tree,
        None => return Err(syntax_error(0, "Expected an expression")),
    };
    let position = tree_position(tree);

    let mut expr = match tok_kind(tree) {
        Some(TokenKind::Decimal(n)) => {
            let n = *n;
            cursor.pos += 1;
            Expr::Literal {
                value: Literal::Integer(n),
                position,
            }
        }
        Some(TokenKind::Str(s)) => {
            let s = s.clone();
            cursor.pos += 1;
            Expr::Literal {
                value: Literal::Str(s),
                position,
            }
        }
        Some(TokenKind::True) => {
            cursor.pos += 1;
            Expr::Literal {
                value: Literal::Boolean(true),
                position,
            }
        }
        Some(TokenKind::False) => {
            cursor.pos += 1;
            Expr::Literal {
                value: Literal::Boolean(false),
                position,
            }
        }
        Some(TokenKind::Null) => {
            cursor.pos += 1;
            Expr::Literal {
                value: Literal::Null,
                position,
            }
        }
        Some(TokenKind::Identifier(name)) => {
            let name = name.clone();
            cursor.pos += 1;
            parse_reference(cursor, name, position)?
        }
        Some(TokenKind::ParenOpen) => {
            let items = cursor.items;
            let close = find_matching_paren(items, cursor.pos)?;
            let inner = &items[cursor.pos + 1..close];
            cursor.pos = close + 1;
            parse_expression(inner)?
        }
        Some(other) => {
            return Err(syntax_error(
                position.line,
                format!("Unexpected '{}' in expression", other),
            ));
        }
        None => {
            return Err(syntax_error(
                position.line,
                "Unexpected block in expression",
            ));
        }
    };

    // Cast chains bind tighter than binary operators.
    while matches!(cursor.peek_kind(), Some(TokenKind::Cast)) {
        let cast_position = cursor.peek().map(tree_position).unwrap_or(position);
        cursor.pos += 1;
        let target = match cursor.peek_kind() {
            Some(TokenKind::Identifier(name)) => {
                let name = name.clone();
                let target_position = cursor.peek().map(tree_position).unwrap_or(position);
                cursor.pos += 1;
                Expr::Identifier {
                    name,
                    position: target_position,
                }
            }
            _ => {
                return Err(syntax_error(
                    cast_position.line,
                    "Expected a type name after 'as'",
                ));
            }
        };
        expr = Expr::Binary {
            left: Box::new(expr),
            op: BinaryOp::CastAs,
            right: Box::new(target),
            position: cast_position,
        };
    }

    Ok(expr)
}

/// An identifier, optionally extended to a dotted attribute path, optionally
/// called with parenthesized arguments.
fn parse_reference(
    cursor: &mut Cursor<'_>,
    base: String,
    position: Position,
) -> Result<Expr, ScriptError> {
    let mut path = Vec::new();
    while matches!(cursor.peek_kind(), Some(TokenKind::Attr)) {
        cursor.pos += 1;
        match cursor.peek_kind() {
            Some(TokenKind::Identifier(name)) => {
                path.push(name.clone());
                cursor.pos += 1;
            }
            _ => {
                return Err(syntax_error(
                    position.line,
                    "Expected an attribute name after '.'",
                ));
            }
        }
    }

    let target = if path.is_empty() {
        Expr::Identifier {
            name: base,
            position,
        }
    } else {
        Expr::Attribute {
            base,
            path,
            position,
        }
    };

    if matches!(cursor.peek_kind(), Some(TokenKind::ParenOpen)) {
        let call_position = cursor.peek().map(tree_position).unwrap_or(position);
        let items = cursor.items;
        let close = find_matching_paren(items, cursor.pos)?;
        let inner = &items[cursor.pos + 1..close];
        let mut args = Vec::new();
        if !inner.is_empty() {
            for group in split_top_level_commas(inner) {
                if group.is_empty() {
                    return Err(syntax_error(call_position.line, "Invalid comma in call"));
                }
                args.push(parse_expression(group)?);
            }
        }
        cursor.pos = close + 1;
        return Ok(Expr::Call {
            callee: Box::new(target),
            args,
            position: call_position,
        });
    }

    Ok(target)
}
