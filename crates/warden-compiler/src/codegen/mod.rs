//! Code generation module
//!
//! Lowers AST nodes into IR instructions.

pub mod condition_codegen;
pub mod policy_codegen;

pub use condition_codegen::ConditionCompiler;
pub use policy_codegen::PolicyCompiler;
