//! Warden Core - Core types and definitions for the Warden policy language
//!
//! This crate provides the fundamental types shared by every stage of the
//! policy toolchain:
//! - Value types for literals and fact snapshots
//! - AST (Abstract Syntax Tree) definitions
//! - IR (Intermediate Representation) definitions and the content hash
//! - The execution DAG used to order policy evaluation
//! - Error types

pub mod ast;
pub mod error;
pub mod ir;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, DagError};
pub use types::{Value, ValueKind};
