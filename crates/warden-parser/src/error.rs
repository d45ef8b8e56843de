//! Parser error types

use crate::token::Position;
use thiserror::Error;

/// Kinds of malformed input the lexer reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    UnexpectedCharacter(char),
    UnterminatedString,
    InvalidEscape(char),
    InvalidNumber(String),
}

/// Lexer error, carrying the position of the offending input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Lex error at {position}: {}", describe(.kind))]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

fn describe(kind: &LexErrorKind) -> String {
    match kind {
        LexErrorKind::UnexpectedCharacter(c) => format!("unexpected character {:?}", c),
        LexErrorKind::UnterminatedString => "unterminated string literal".to_string(),
        LexErrorKind::InvalidEscape(c) => format!("invalid escape sequence '\\{}'", c),
        LexErrorKind::InvalidNumber(text) => format!("invalid number literal '{}'", text),
    }
}

/// Parser error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Tokenization failed
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A token did not fit the grammar
    #[error("Parse error at {position}: expected {expected}, found {found}")]
    Unexpected {
        position: Position,
        expected: String,
        found: String,
    },

    /// A header field was given twice
    #[error("Parse error at {position}: duplicate header '{field}'")]
    DuplicateHeader { position: Position, field: String },

    /// A number token that does not fit an f64
    #[error("Parse error at {position}: invalid number '{text}'")]
    InvalidNumber { position: Position, text: String },

    /// Parentheses nested past the parser's limit
    #[error("Parse error at {position}: conditions nested deeper than {limit} levels")]
    NestingTooDeep { position: Position, limit: usize },
}

impl ParseError {
    /// Position of the error in the source
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(e) => e.position,
            ParseError::Unexpected { position, .. }
            | ParseError::DuplicateHeader { position, .. }
            | ParseError::InvalidNumber { position, .. }
            | ParseError::NestingTooDeep { position, .. } => *position,
        }
    }
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
