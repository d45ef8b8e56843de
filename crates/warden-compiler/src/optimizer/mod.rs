//! Optimization module
//!
//! IR-to-IR passes plus the cross-policy analyses that run on compiled IR:
//! - constant folding
//! - dead-clause elimination
//! - clause ordering (DAG sort of `after` edges)
//! - conflict detection (reports only, never rewrites)

pub mod conflict_detection;
pub mod constant_folding;
pub mod dag_sort;
pub mod dead_clause_elimination;

pub use conflict_detection::{ConflictDetector, ConflictType, PolicyConflict};
pub use constant_folding::ConstantFolder;
pub use dag_sort::ClauseOrdering;
pub use dead_clause_elimination::DeadClauseEliminator;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::ir::PolicyIr;

/// Passes to run, each individually toggleable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassSet {
    pub constant_folding: bool,
    pub dead_clause_elimination: bool,
    pub clause_ordering: bool,
}

impl Default for PassSet {
    fn default() -> Self {
        Self::all()
    }
}

impl PassSet {
    pub fn all() -> Self {
        Self {
            constant_folding: true,
            dead_clause_elimination: true,
            clause_ordering: true,
        }
    }

    pub fn none() -> Self {
        Self {
            constant_folding: false,
            dead_clause_elimination: false,
            clause_ordering: false,
        }
    }
}

/// What a pass did to a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Constant windows were collapsed
    Folded,
    /// The clause can never match and was dropped
    ClauseRemoved,
    /// A dependency on a removed clause was dropped
    DependencyDropped,
    /// Clause order changed to honour `after` edges
    Reordered,
}

/// A report emitted by an optimizer pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerDiagnostic {
    /// Name of the pass that emitted the diagnostic
    pub pass: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clause_id: Option<String>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl OptimizerDiagnostic {
    pub fn new(
        pass: &str,
        clause_id: Option<&str>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            pass: pass.to_string(),
            clause_id: clause_id.map(str::to_string),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for OptimizerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.clause_id {
            Some(clause_id) => write!(f, "{}: clause '{}': {}", self.pass, clause_id, self.message),
            None => write!(f, "{}: {}", self.pass, self.message),
        }
    }
}

/// Output of one pass: the rewritten IR and what changed
pub type PassOutput = (PolicyIr, Vec<OptimizerDiagnostic>);

/// An IR-to-IR rewrite
pub trait OptimizationPass {
    /// Name used in diagnostics
    fn name(&self) -> &'static str;

    /// Run the pass; the output IR carries a fresh hash when anything changed
    fn run(&self, ir: &PolicyIr) -> Result<PassOutput>;
}

/// Run the enabled passes in a fixed order: fold, eliminate, order
pub fn optimize(ir: &PolicyIr, passes: &PassSet) -> Result<PassOutput> {
    let mut pipeline: Vec<Box<dyn OptimizationPass>> = Vec::new();
    if passes.constant_folding {
        pipeline.push(Box::new(ConstantFolder::new()));
    }
    if passes.dead_clause_elimination {
        pipeline.push(Box::new(DeadClauseEliminator::new()));
    }
    if passes.clause_ordering {
        pipeline.push(Box::new(ClauseOrdering::new()));
    }

    let mut current = ir.clone();
    let mut diagnostics = Vec::new();
    for pass in pipeline {
        let (next, mut reported) = pass.run(&current)?;
        log::debug!(
            "pass {} on '{}': {} diagnostic(s)",
            pass.name(),
            next.policy_id,
            reported.len()
        );
        diagnostics.append(&mut reported);
        current = next;
    }
    Ok((current, diagnostics))
}
