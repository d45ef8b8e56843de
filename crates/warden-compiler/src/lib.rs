//! Warden Compiler - AST to IR compiler
//!
//! This crate turns parsed policies into content-addressed `PolicyIr`:
//! - `validator` checks an AST against the language rules
//! - `codegen` lowers conditions to postfix stack programs
//! - `optimizer` runs the IR-to-IR passes and cross-policy analyses
//! - `compiler` ties the stages together behind one facade

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod optimizer;
pub mod validator;

// Re-export main types
pub use compiler::{Compilation, Compiler, CompilerOptions};
pub use error::{CompileError, Result};

// Re-export codegen types
pub use codegen::{ConditionCompiler, PolicyCompiler};

// Re-export optimizer types
pub use optimizer::{
    optimize, ConflictDetector, ConflictType, ConstantFolder, DeadClauseEliminator, DiagnosticKind,
    OptimizerDiagnostic, PassSet, PolicyConflict,
};

// Re-export validator types
pub use validator::{Severity, ValidationContext, ValidationIssue, ValidationResult, Validator};
