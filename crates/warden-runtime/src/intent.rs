//! Intent emission
//!
//! Converts evaluation results into intents for the caller to act on. The
//! toolchain never acts on an intent itself.

use crate::result::{EvaluationResult, ExecutionTrace};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use warden_core::ast::{ActionKind, Mode};

/// What the caller is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentType {
    Warn,
    Block,
    RequireApproval,
    Allow,
}

impl From<ActionKind> for IntentType {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Warn => IntentType::Warn,
            ActionKind::Block => IntentType::Block,
            ActionKind::RequireApproval => IntentType::RequireApproval,
            ActionKind::Allow => IntentType::Allow,
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntentType::Warn => "WARN",
            IntentType::Block => "BLOCK",
            IntentType::RequireApproval => "REQUIRE_APPROVAL",
            IntentType::Allow => "ALLOW",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentPayload {
    pub policy_id: String,
    pub clause_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set for MONITOR policies: report, do not enforce
    pub advisory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub intent_type: IntentType,
    pub payload: IntentPayload,
}

/// Pure converter from results to intents
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentEmitter;

impl IntentEmitter {
    pub fn new() -> Self {
        Self
    }

    /// One intent per matched action, in clause order
    ///
    /// Only exact `(clause_id, intent_type)` repeats are dropped.
    pub fn emit(&self, result: &EvaluationResult) -> Vec<Intent> {
        let advisory = result.mode == Mode::Monitor;
        let mut seen = HashSet::new();

        result
            .action_results
            .iter()
            .filter_map(|action| {
                let intent_type = IntentType::from(action.action.kind);
                if !seen.insert((action.clause_id.as_str(), intent_type)) {
                    return None;
                }
                Some(Intent {
                    intent_type,
                    payload: IntentPayload {
                        policy_id: result.policy_id.clone(),
                        clause_id: action.clause_id.clone(),
                        message: action.action.message.clone(),
                        advisory,
                    },
                })
            })
            .collect()
    }

    /// Intents of every stage, in stage order
    pub fn emit_trace(&self, trace: &ExecutionTrace) -> Vec<Intent> {
        trace
            .stage_results
            .iter()
            .flat_map(|stage| self.emit(&stage.evaluation))
            .collect()
    }
}
