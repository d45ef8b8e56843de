//! Evaluation result types

use super::trace::ClauseTrace;
use serde::{Deserialize, Serialize};
use warden_core::ast::{ActionKind, Mode};
use warden_core::ir::ActionDescriptor;

/// Result of evaluating one policy against one fact snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub policy_id: String,

    /// Hash of the IR that produced this result
    pub ir_hash: String,

    pub mode: Mode,

    /// One entry per clause, in evaluation order
    pub clause_results: Vec<ClauseResult>,

    /// Actions of matched clauses, in clause order
    pub action_results: Vec<ActionResult>,

    /// A matched clause asked the executor to stop
    pub halt_requested: bool,
}

/// Outcome of a single clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseResult {
    pub clause_id: String,
    pub matched: bool,
    pub trace: ClauseTrace,
}

/// A matched action; descriptive only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub clause_id: String,
    pub action: ActionDescriptor,
}

impl EvaluationResult {
    /// IDs of matched clauses, in evaluation order
    pub fn matched_clauses(&self) -> Vec<&str> {
        self.clause_results
            .iter()
            .filter(|c| c.matched)
            .map(|c| c.clause_id.as_str())
            .collect()
    }

    /// Returns true if any clause matched
    pub fn is_match(&self) -> bool {
        self.clause_results.iter().any(|c| c.matched)
    }

    /// Returns true if a matched clause carries an action of the given kind
    pub fn has_action(&self, kind: ActionKind) -> bool {
        self.action_results.iter().any(|a| a.action.kind == kind)
    }

    pub fn clause(&self, clause_id: &str) -> Option<&ClauseResult> {
        self.clause_results.iter().find(|c| c.clause_id == clause_id)
    }

    /// Every diagnostic raised while evaluating, prefixed with its clause
    pub fn diagnostics(&self) -> Vec<String> {
        self.clause_results
            .iter()
            .flat_map(|c| {
                c.trace
                    .diagnostics
                    .iter()
                    .map(move |d| format!("{}: {}", c.clause_id, d))
            })
            .collect()
    }
}
