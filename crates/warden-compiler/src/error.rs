//! Compiler error types

use crate::validator::ValidationIssue;
use thiserror::Error;
use warden_core::{CoreError, DagError};
use warden_parser::ParseError;

/// Compiler error
#[derive(Error, Debug)]
pub enum CompileError {
    /// Lexing or parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Validation reported Error-severity issues
    #[error("Validation failed with {} error(s): {}", .issues.len(), summarize(.issues))]
    Validation { issues: Vec<ValidationIssue> },

    /// Clause or policy ordering failed
    #[error("Ordering error: {0}")]
    Dag(#[from] DagError),

    /// Hashing or serialization of the IR failed
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The AST cannot be lowered (only reachable with validation disabled)
    #[error("Structural error: {0}")]
    Structural(String),
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;
