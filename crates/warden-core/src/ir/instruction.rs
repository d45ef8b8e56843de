//! IR Instructions
//!
//! Low-level instructions for the Warden stack machine. The set is closed:
//! every consumer (interpreter, optimizer passes, serializer) matches it
//! exhaustively.

use crate::ast::Comparator;
use crate::Value;
use serde::{Deserialize, Serialize};

/// A single IR instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // ===== Data Loading =====
    /// Push a literal constant onto the stack
    PushConst {
        /// The constant value
        value: Value,
    },

    /// Push the value of a fact onto the stack
    PushFact {
        /// Metric name in the fact snapshot
        metric: String,
    },

    // ===== Operations =====
    /// Pop two values, push the boolean comparison result
    Compare {
        /// The comparison operator
        comparator: Comparator,
    },

    /// Pop two booleans, push their conjunction
    And,

    /// Pop two booleans, push their disjunction
    Or,

    /// Push whether a metric is present (and non-null) in the fact snapshot
    ExistsCheck {
        /// Metric name
        metric: String,
    },

    // ===== Control Flow =====
    /// Scope guard: end the clause unmatched unless `key` equals `expected`
    PolicyCheck {
        /// Fact key carrying the scope value
        key: String,
        /// Required scope value
        expected: String,
    },

    /// Pop the clause verdict and stop the clause program
    HaltMatch,
}

impl Instruction {
    /// Short mnemonic, used in traces and diagnostics
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::PushConst { .. } => "push_const",
            Instruction::PushFact { .. } => "push_fact",
            Instruction::Compare { .. } => "compare",
            Instruction::And => "and",
            Instruction::Or => "or",
            Instruction::ExistsCheck { .. } => "exists_check",
            Instruction::PolicyCheck { .. } => "policy_check",
            Instruction::HaltMatch => "halt_match",
        }
    }

    /// Returns true if executing the instruction reads the fact snapshot
    pub fn reads_facts(&self) -> bool {
        match self {
            Instruction::PushFact { .. }
            | Instruction::ExistsCheck { .. }
            | Instruction::PolicyCheck { .. } => true,
            Instruction::PushConst { .. }
            | Instruction::Compare { .. }
            | Instruction::And
            | Instruction::Or
            | Instruction::HaltMatch => false,
        }
    }

    /// Net change in stack depth caused by the instruction
    pub fn stack_effect(&self) -> isize {
        match self {
            Instruction::PushConst { .. }
            | Instruction::PushFact { .. }
            | Instruction::ExistsCheck { .. } => 1,
            Instruction::Compare { .. } | Instruction::And | Instruction::Or => -1,
            Instruction::PolicyCheck { .. } => 0,
            Instruction::HaltMatch => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_instructions() {
        let push_fact = Instruction::PushFact {
            metric: "cost_usd".to_string(),
        };
        let push_const = Instruction::PushConst {
            value: Value::Number(100.0),
        };

        assert!(matches!(push_fact, Instruction::PushFact { .. }));
        assert!(matches!(push_const, Instruction::PushConst { .. }));
        assert!(push_fact.reads_facts());
        assert!(!push_const.reads_facts());
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::And.mnemonic(), "and");
        assert_eq!(Instruction::HaltMatch.mnemonic(), "halt_match");
        assert_eq!(
            Instruction::Compare {
                comparator: Comparator::Gt
            }
            .mnemonic(),
            "compare"
        );
    }

    #[test]
    fn test_stack_effects_balance_for_predicate() {
        // cost_usd > 100, halt
        let program = [
            Instruction::PushFact {
                metric: "cost_usd".to_string(),
            },
            Instruction::PushConst {
                value: Value::Number(100.0),
            },
            Instruction::Compare {
                comparator: Comparator::Gt,
            },
            Instruction::HaltMatch,
        ];
        let depth: isize = program.iter().map(Instruction::stack_effect).sum();
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_instruction_serde() {
        let inst = Instruction::PolicyCheck {
            key: "resource".to_string(),
            expected: "payments".to_string(),
        };

        let json = serde_json::to_string(&inst).unwrap();
        assert!(json.contains("PolicyCheck"));

        let deserialized: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, inst);
    }
}
