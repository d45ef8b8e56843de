//! Execution tracing types
//!
//! Clause traces record every instruction the interpreter executed; the
//! execution trace records every stage the DAG executor ran.

use super::evaluation::EvaluationResult;
use serde::{Deserialize, Serialize};

/// One executed instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Instruction pointer
    pub ip: usize,
    pub mnemonic: String,
    /// Stack depth after the instruction ran
    pub stack_depth: usize,
}

/// Trace of a single clause program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseTrace {
    pub steps: Vec<TraceStep>,

    /// Non-fatal findings, such as a metric missing in lenient mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ClauseTrace {
    pub(crate) fn step(&mut self, ip: usize, mnemonic: &str, stack_depth: usize) {
        self.steps.push(TraceStep {
            ip,
            mnemonic: mnemonic.to_string(),
            stack_depth,
        });
    }
}

/// Result of one DAG node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub node_id: String,
    pub evaluation: EvaluationResult,
}

/// Trace of a whole DAG execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Stages in execution order
    pub stage_results: Vec<StageResult>,

    /// Node whose result stopped the walk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted_at: Option<String>,
}

impl ExecutionTrace {
    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    pub fn stage(&self, node_id: &str) -> Option<&StageResult> {
        self.stage_results.iter().find(|s| s.node_id == node_id)
    }

    /// Node ids in the order they ran
    pub fn executed_nodes(&self) -> Vec<&str> {
        self.stage_results
            .iter()
            .map(|s| s.node_id.as_str())
            .collect()
    }
}
