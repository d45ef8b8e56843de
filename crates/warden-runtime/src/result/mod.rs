//! Evaluation result and trace types

mod evaluation;
mod trace;

pub use evaluation::{ActionResult, ClauseResult, EvaluationResult};
pub use trace::{ClauseTrace, ExecutionTrace, StageResult, TraceStep};
