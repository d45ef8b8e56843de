//! Warden Parser - DSL text to AST
//!
//! This crate turns policy source text into `warden_core::ast` values:
//! - `lexer` splits text into tokens
//! - `parser` builds a `PolicyAst` by recursive descent
//! - `printer` serializes an AST back into DSL text

pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

// Re-export main parser types
pub use error::{LexError, LexErrorKind, ParseError, Result};
pub use lexer::Lexer;
pub use parser::{parse_policy, parse_policy_set, Parser, MAX_NESTING_DEPTH};
pub use printer::to_dsl;
pub use token::{Position, Token, TokenKind};
