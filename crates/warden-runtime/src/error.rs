//! Runtime error types

use thiserror::Error;
use warden_core::{CoreError, ValueKind};

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// An operand had the wrong kind; values are never coerced
    #[error("Type mismatch on '{metric}': expected {expected_kind}, found {actual_kind}")]
    TypeMismatch {
        metric: String,
        expected_kind: ValueKind,
        actual_kind: ValueKind,
    },

    /// A referenced metric is absent from the fact snapshot (strict mode)
    #[error("Missing metric: {metric}")]
    MissingMetric { metric: String },

    /// An instruction popped an empty stack
    #[error("Stack underflow in clause '{clause_id}' at instruction {ip}")]
    StackUnderflow { clause_id: String, ip: usize },

    /// The clause program is not well formed
    #[error("Malformed program in clause '{clause_id}': {reason}")]
    MalformedProgram { clause_id: String, reason: String },

    /// The stored hash does not match the IR contents
    #[error("Integrity mismatch for policy '{policy_id}': stored hash {expected}, computed {actual}")]
    IntegrityMismatch {
        policy_id: String,
        expected: String,
        actual: String,
    },

    /// A DAG node has no compiled policy
    #[error("No program for execution node '{0}'")]
    MissingNodeProgram(String),

    /// Fact input could not be decoded
    #[error("Invalid facts: {0}")]
    InvalidFacts(#[from] serde_json::Error),

    /// Hash recomputation failed
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
