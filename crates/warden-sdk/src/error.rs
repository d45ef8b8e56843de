//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parser error
    #[error("Parser error: {0}")]
    Parse(#[from] warden_parser::ParseError),

    /// Compiler error
    #[error("Compiler error: {0}")]
    Compile(#[from] warden_compiler::CompileError),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(#[from] warden_runtime::RuntimeError),

    /// Policy ordering error
    #[error("Ordering error: {0}")]
    Dag(#[from] warden_core::DagError),

    /// IR hashing or serialization error
    #[error("IR error: {0}")]
    Core(#[from] warden_core::CoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No installed policy has this hash
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
