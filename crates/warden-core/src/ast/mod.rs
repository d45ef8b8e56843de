//! Abstract Syntax Tree (AST) definitions for Warden policies
//!
//! This module contains the AST node definitions for:
//! - Policies and their metadata
//! - Clauses and actions
//! - Conditions (predicates, existence checks, logical groups)
//!
//! AST nodes are plain owned values. Trees are built bottom-up by the parser
//! and never mutated afterwards; later stages produce new values.

pub mod clause;
pub mod condition;
pub mod policy;

pub use clause::{Action, ActionKind, Clause};
pub use condition::{Comparator, Condition, LogicalOperator};
pub use policy::{Category, Mode, PolicyAst, PolicyMetadata};
