//! Lexer token types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a token or error in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset from the start of the source
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Position of the first character of a source
    pub fn start() -> Self {
        Self::new(0, 1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token kinds for the Warden DSL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Keywords
    Policy,
    Clause,
    After,
    Exists,
    Halt,
    True,
    False,
    And,
    Or,

    // Literals and names
    Ident,
    Number,
    String,

    // Comparators
    EqEq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semicolon,
    Comma,
    Arrow,

    Eof,
}

impl TokenKind {
    /// Keyword lookup for an identifier-shaped word
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "policy" => Some(TokenKind::Policy),
            "clause" => Some(TokenKind::Clause),
            "after" => Some(TokenKind::After),
            "exists" => Some(TokenKind::Exists),
            "halt" => Some(TokenKind::Halt),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "AND" => Some(TokenKind::And),
            "OR" => Some(TokenKind::Or),
            _ => None,
        }
    }

    /// Human readable description, used in parse errors
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Policy => "'policy'",
            TokenKind::Clause => "'clause'",
            TokenKind::After => "'after'",
            TokenKind::Exists => "'exists'",
            TokenKind::Halt => "'halt'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::And => "'AND'",
            TokenKind::Or => "'OR'",
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Arrow => "'->'",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A lexed token
///
/// For string tokens `text` holds the unescaped contents; for every other
/// kind it is the exact source slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}
