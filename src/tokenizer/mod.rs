use std::collections::HashMap;
use std::fmt;

use crate::errors::{ErrorKind, ScriptError};

/// Represents the position of a token in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// All possible token types in MambaScript
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Decimal(i64),
    Str(String),
    True,
    False,
    Null,

    // Identifiers and keywords
    Identifier(String),
    Static,
    Func,
    If,
    ElseIf,
    Else,
    Try,
    Catch,
    Throw,
    Return,
    Import,
    Cast, // `as`

    // Operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    PlusAssign,
    MinusAssign,
    TimesAssign,
    DivideAssign,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    In,
    NotIn,
    Assign,

    // Delimiters
    Comma,
    Qmark,
    Attr,
    BlockOpen,
    BlockClose,
    ParenOpen,
    ParenClose,

    // Special
    Eol,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Decimal(n) => write!(f, "{}", n),
            TokenKind::Str(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(name) => write!(f, "{}", name),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Eol => write!(f, "end of line"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A token with its kind and position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

/// Tokenizer for MambaScript source text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    keywords: HashMap<&'static str, TokenKind>,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("static", TokenKind::Static);
        keywords.insert("func", TokenKind::Func);
        keywords.insert("if", TokenKind::If);
        keywords.insert("elif", TokenKind::ElseIf);
        keywords.insert("else", TokenKind::Else);
        keywords.insert("try", TokenKind::Try);
        keywords.insert("catch", TokenKind::Catch);
        keywords.insert("throw", TokenKind::Throw);
        keywords.insert("return", TokenKind::Return);
        keywords.insert("import", TokenKind::Import);
        keywords.insert("as", TokenKind::Cast);
        keywords.insert("is", TokenKind::Equal);
        keywords.insert("isnot", TokenKind::NotEqual);
        keywords.insert("in", TokenKind::In);
        keywords.insert("true", TokenKind::True);
        keywords.insert("false", TokenKind::False);
        keywords.insert("none", TokenKind::Null);
        keywords.insert("null", TokenKind::Null);

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ScriptError> {
        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            if self.current_char() == '\n' {
                self.handle_newline();
                continue;
            }

            if self.current_char() == '/' && self.peek_char() == Some('/') {
                self.handle_comment();
                continue;
            }

            if self.current_char() == '"' {
                self.handle_string()?;
                continue;
            }

            if self.current_char().is_ascii_digit() {
                self.handle_number()?;
                continue;
            }

            if self.current_char().is_alphabetic()
                || self.current_char() == '_'
                || self.current_char() == '$'
            {
                self.handle_identifier()?;
                continue;
            }

            self.handle_operator_or_delimiter()?;
        }

        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        if self.position + 1 >= self.input.len() {
            None
        } else {
            Some(self.input[self.position + 1])
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.current_char();
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.position)
    }

    fn emit(&mut self, kind: TokenKind, position: Position) {
        self.tokens.push(Token::new(kind, position));
    }

    fn skip_whitespace(&mut self) {
        // Only spaces and tabs; newlines become Eol tokens.
        while !self.is_at_end()
            && self.current_char().is_whitespace()
            && self.current_char() != '\n'
        {
            self.advance();
        }
    }

    fn handle_newline(&mut self) {
        let position = self.current_position();
        // A run of newlines (including blank lines) collapses to one Eol.
        loop {
            if self.is_at_end() {
                break;
            }
            if self.current_char() == '\n' {
                self.advance();
                continue;
            }
            if self.current_char() == ' ' || self.current_char() == '\t' {
                let mut lookahead = self.position;
                while lookahead < self.input.len()
                    && (self.input[lookahead] == ' ' || self.input[lookahead] == '\t')
                {
                    lookahead += 1;
                }
                if lookahead < self.input.len() && self.input[lookahead] == '\n' {
                    while self.position < lookahead {
                        self.advance();
                    }
                    continue;
                }
            }
            break;
        }
        self.emit(TokenKind::Eol, position);
    }

    fn handle_comment(&mut self) {
        while !self.is_at_end() && self.current_char() != '\n' {
            self.advance();
        }
    }

    fn handle_string(&mut self) -> Result<(), ScriptError> {
        let position = self.current_position();
        self.advance(); // consume opening quote

        let mut value = String::new();
        while !self.is_at_end() && self.current_char() != '"' {
            if self.current_char() == '\\' {
                self.advance(); // consume backslash
                if self.is_at_end() {
                    return Err(ScriptError::new(
                        ErrorKind::Syntax,
                        position.line,
                        "Unterminated string literal",
                    ));
                }
                match self.current_char() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
                self.advance();
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(ScriptError::new(
                ErrorKind::Syntax,
                position.line,
                "Unterminated string literal",
            ));
        }

        self.advance(); // consume closing quote
        self.emit(TokenKind::Str(value), position);
        Ok(())
    }

    fn handle_number(&mut self) -> Result<(), ScriptError> {
        let position = self.current_position();
        let mut number = String::new();
        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            number.push(self.advance());
        }

        match number.parse::<i64>() {
            Ok(n) => {
                self.emit(TokenKind::Decimal(n), position);
                Ok(())
            }
            Err(_) => Err(ScriptError::new(
                ErrorKind::Syntax,
                position.line,
                format!("Invalid decimal literal: {}", number),
            )),
        }
    }

    fn handle_identifier(&mut self) -> Result<(), ScriptError> {
        let position = self.current_position();

        // The `$` reference sigil is accepted and stripped, so `$x` and `x`
        // name the same binding.
        let sigil = self.current_char() == '$';
        if sigil {
            self.advance();
        }

        let mut name = String::new();
        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            name.push(self.advance());
        }

        if name.is_empty() {
            return Err(ScriptError::new(
                ErrorKind::Syntax,
                position.line,
                "Expected a variable name after '$'",
            ));
        }

        if !sigil {
            if name == "else" && self.try_merge_else_if() {
                self.emit(TokenKind::ElseIf, position);
                return Ok(());
            }
            if let Some(kind) = self.keywords.get(name.as_str()) {
                let kind = kind.clone();
                self.emit(kind, position);
                return Ok(());
            }
        }

        self.emit(TokenKind::Identifier(name), position);
        Ok(())
    }

    /// `else` directly followed by `if` on the same line lexes as one token.
    fn try_merge_else_if(&mut self) -> bool {
        let mut cursor = self.position;
        while cursor < self.input.len()
            && (self.input[cursor] == ' ' || self.input[cursor] == '\t')
        {
            cursor += 1;
        }
        let mut word = String::new();
        while cursor < self.input.len()
            && (self.input[cursor].is_alphanumeric() || self.input[cursor] == '_')
        {
            word.push(self.input[cursor]);
            cursor += 1;
        }

        if word == "if" {
            self.column += cursor - self.position;
            self.position = cursor;
            true
        } else {
            false
        }
    }

    fn handle_operator_or_delimiter(&mut self) -> Result<(), ScriptError> {
        let position = self.current_position();
        let ch = self.advance();

        let kind = match ch {
            '+' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::TimesAssign
                } else {
                    TokenKind::Multiply
                }
            }
            '/' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::DivideAssign
                } else {
                    TokenKind::Divide
                }
            }
            '%' => TokenKind::Modulus,
            '=' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::Equal
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::NotEqual
                } else if self.matches_word("in") {
                    TokenKind::NotIn
                } else {
                    return Err(self.illegal_character('!', position));
                }
            }
            '>' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '<' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            ',' => TokenKind::Comma,
            '?' => TokenKind::Qmark,
            '.' => TokenKind::Attr,
            '{' => TokenKind::BlockOpen,
            '}' => TokenKind::BlockClose,
            '(' => TokenKind::ParenOpen,
            ')' => TokenKind::ParenClose,
            other => return Err(self.illegal_character(other, position)),
        };

        self.emit(kind, position);
        Ok(())
    }

    /// Consume `word` if it sits at the cursor with a non-identifier
    /// character after it.
    fn matches_word(&mut self, word: &str) -> bool {
        let chars: Vec<char> = word.chars().collect();
        let end = self.position + chars.len();
        if end > self.input.len() {
            return false;
        }
        if self.input[self.position..end] != chars[..] {
            return false;
        }
        if end < self.input.len() {
            let next = self.input[end];
            if next.is_alphanumeric() || next == '_' {
                return false;
            }
        }
        for _ in 0..chars.len() {
            self.advance();
        }
        true
    }

    fn illegal_character(&self, ch: char, position: Position) -> ScriptError {
        ScriptError::new(
            ErrorKind::Syntax,
            position.line,
            format!("Illegal character '{}' at column {}", ch, position.column),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Tokenizer::new(input)
            .tokenize()
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_basic_tokenization() {
        let actual = kinds("$x = 5 + 3");
        let expected = vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::Assign,
            TokenKind::Decimal(5),
            TokenKind::Plus,
            TokenKind::Decimal(3),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let actual = kinds("static func if else try catch throw return import banana");
        let expected = vec![
            TokenKind::Static,
            TokenKind::Func,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Try,
            TokenKind::Catch,
            TokenKind::Throw,
            TokenKind::Return,
            TokenKind::Import,
            TokenKind::Identifier("banana".to_string()),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_else_if_merges_into_one_token() {
        assert_eq!(kinds("else if"), vec![TokenKind::ElseIf]);
        assert_eq!(kinds("elif"), vec![TokenKind::ElseIf]);
        assert_eq!(
            kinds("else x"),
            vec![TokenKind::Else, TokenKind::Identifier("x".to_string())]
        );
    }

    #[test]
    fn test_operators() {
        let actual = kinds("+ - * / % == != >= > <= < += -= *= /= = is isnot in !in as");
        let expected = vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Multiply,
            TokenKind::Divide,
            TokenKind::Modulus,
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::GreaterEqual,
            TokenKind::Greater,
            TokenKind::LessEqual,
            TokenKind::Less,
            TokenKind::PlusAssign,
            TokenKind::MinusAssign,
            TokenKind::TimesAssign,
            TokenKind::DivideAssign,
            TokenKind::Assign,
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::In,
            TokenKind::NotIn,
            TokenKind::Cast,
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_sigil_is_stripped() {
        assert_eq!(
            kinds("$count"),
            vec![TokenKind::Identifier("count".to_string())]
        );
        // A sigil shields keywords, so `$if` is a plain identifier.
        assert_eq!(kinds("$if"), vec![TokenKind::Identifier("if".to_string())]);
    }

    #[test]
    fn test_string_literals_and_escapes() {
        assert_eq!(
            kinds(r#""hello" "line\n" "quote\"q" "back\\""#),
            vec![
                TokenKind::Str("hello".to_string()),
                TokenKind::Str("line\n".to_string()),
                TokenKind::Str("quote\"q".to_string()),
                TokenKind::Str("back\\".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let actual = kinds("$x = 1 // trailing note\n$y = 2");
        assert_eq!(
            actual,
            vec![
                TokenKind::Identifier("x".to_string()),
                TokenKind::Assign,
                TokenKind::Decimal(1),
                TokenKind::Eol,
                TokenKind::Identifier("y".to_string()),
                TokenKind::Assign,
                TokenKind::Decimal(2),
            ]
        );
    }

    #[test]
    fn test_blank_lines_collapse_to_one_eol() {
        let actual = kinds("$x = 1\n\n\n$y = 2");
        let eols = actual
            .iter()
            .filter(|k| matches!(k, TokenKind::Eol))
            .count();
        assert_eq!(eols, 1);
    }

    #[test]
    fn test_illegal_character_is_fatal() {
        let err = Tokenizer::new("$x = @").tokenize().expect_err("should fail");
        assert_eq!(err.kind, crate::errors::ErrorKind::Syntax);
        assert!(err.message.contains('@'));
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let err = Tokenizer::new("\"abc").tokenize().expect_err("should fail");
        assert!(err.message.contains("Unterminated"));
    }

    #[test]
    fn test_position_tracking() {
        let tokens = Tokenizer::new("x = 1\ny = 2").tokenize().expect("tokenize");
        let y = tokens
            .iter()
            .find(|t| matches!(&t.kind, TokenKind::Identifier(name) if name == "y"))
            .expect("y token");
        assert_eq!(y.position.line, 2);
    }
}
