//! DAG executor
//!
//! Walks an `ExecutionDag` in its total order and runs one interpreter
//! invocation per node. The walk stops early only when a node's own result
//! requests a halt.

use crate::context::FactSnapshot;
use crate::engine::Interpreter;
use crate::error::{Result, RuntimeError};
use crate::result::{ExecutionTrace, StageResult};
use std::collections::BTreeMap;
use warden_core::ir::{ExecutionDag, PolicyIr};

/// Multi-policy executor
#[derive(Debug, Clone, Copy, Default)]
pub struct DagExecutor {
    interpreter: Interpreter,
}

impl DagExecutor {
    pub fn new(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Execute every node of the DAG against the same fact snapshot
    ///
    /// `programs` maps node ids to compiled policies.
    pub fn execute(
        &self,
        dag: &ExecutionDag,
        programs: &BTreeMap<String, PolicyIr>,
        facts: &FactSnapshot,
    ) -> Result<ExecutionTrace> {
        let mut trace = ExecutionTrace::default();

        for node_id in dag.order() {
            let ir = programs
                .get(node_id)
                .ok_or_else(|| RuntimeError::MissingNodeProgram(node_id.clone()))?;

            let evaluation = self.interpreter.evaluate(ir, facts)?;
            let halt = evaluation.halt_requested;
            tracing::debug!(
                node_id = %node_id,
                matched = evaluation.is_match(),
                halt,
                "stage executed"
            );
            trace.stage_results.push(StageResult {
                node_id: node_id.clone(),
                evaluation,
            });

            if halt {
                tracing::info!(node_id = %node_id, "execution halted");
                trace.halted_at = Some(node_id.clone());
                break;
            }
        }

        Ok(trace)
    }
}
