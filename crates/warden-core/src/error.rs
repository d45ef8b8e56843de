//! Error types for Warden Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while building an execution DAG
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DagError {
    /// The declared dependencies contain a cycle
    #[error("Dependency cycle detected between: {}", participants.join(", "))]
    Cycle { participants: Vec<String> },

    /// A node depends on an id that is not part of the graph
    #[error("Node '{node}' depends on unknown node '{dependency}'")]
    UnknownDependency { node: String, dependency: String },

    /// Two nodes share the same id
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
