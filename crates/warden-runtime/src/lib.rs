//! Warden Runtime - Execution engine for compiled Warden policies
//!
//! This crate evaluates `PolicyIr` against fact snapshots:
//! - `engine` holds the stack-machine interpreter
//! - `executor` walks a policy DAG, one interpreter run per node
//! - `intent` turns results into intents for the caller
//!
//! Nothing here performs I/O or reads the clock; results depend only on the
//! IR and the facts.

pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod intent;
pub mod result;

// Re-export main types
pub use context::FactSnapshot;
pub use engine::{evaluate, Interpreter};
pub use error::{Result, RuntimeError};
pub use executor::DagExecutor;
pub use intent::{Intent, IntentEmitter, IntentPayload, IntentType};
pub use result::{
    ActionResult, ClauseResult, ClauseTrace, EvaluationResult, ExecutionTrace, StageResult,
    TraceStep,
};
