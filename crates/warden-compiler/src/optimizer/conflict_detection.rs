//! Conflict detection
//!
//! Scans compiled policies for clause pairs that share a scope and a
//! condition shape but ask for mutually exclusive outcomes. A clause whose
//! condition is the constant `true` matches every shape, so an always-allow
//! clause conflicts with any block or approval in the same scope.
//!
//! Conflicts are reported, never resolved.

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::ast::ActionKind;
use warden_core::ir::{CompiledClause, Instruction, PolicyIr};
use warden_core::Value;

/// Known contradiction shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// One clause blocks what the other allows
    BlockVersusAllow,
    /// One clause routes to approval what the other allows outright
    ApprovalVersusAllow,
    /// One clause asks for approval of what the other blocks
    BlockVersusApproval,
}

impl ConflictType {
    /// Action kinds on each side of the contradiction
    fn sides(&self) -> (ActionKind, ActionKind) {
        match self {
            ConflictType::BlockVersusAllow => (ActionKind::Block, ActionKind::Allow),
            ConflictType::ApprovalVersusAllow => (ActionKind::RequireApproval, ActionKind::Allow),
            ConflictType::BlockVersusApproval => (ActionKind::Block, ActionKind::RequireApproval),
        }
    }

    const ALL: [ConflictType; 3] = [
        ConflictType::BlockVersusAllow,
        ConflictType::ApprovalVersusAllow,
        ConflictType::BlockVersusApproval,
    ];
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.sides();
        write!(f, "{} vs {}", a, b)
    }
}

/// A pair of clauses whose outcomes contradict each other
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConflict {
    pub conflict_type: ConflictType,
    pub policy_a: String,
    pub policy_b: String,
    pub clause_a: String,
    pub clause_b: String,
    pub explanation: String,
}

impl PolicyConflict {
    fn sort_key(&self) -> (&str, &str, &str, &str, ConflictType) {
        (
            self.policy_a.as_str(),
            self.clause_a.as_str(),
            self.policy_b.as_str(),
            self.clause_b.as_str(),
            self.conflict_type,
        )
    }
}

/// Cross-policy conflict detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

struct Site<'a> {
    policy: &'a PolicyIr,
    clause: &'a CompiledClause,
}

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Find every conflicting clause pair, sorted
    pub fn detect(&self, policies: &[PolicyIr]) -> Vec<PolicyConflict> {
        let mut sites: Vec<Site<'_>> = policies
            .iter()
            .flat_map(|policy| {
                policy
                    .clauses
                    .iter()
                    .map(move |clause| Site { policy, clause })
            })
            .collect();
        sites.sort_by(|a, b| {
            (&a.policy.policy_id, &a.clause.clause_id).cmp(&(&b.policy.policy_id, &b.clause.clause_id))
        });

        let mut conflicts = Vec::new();
        for (i, a) in sites.iter().enumerate() {
            for b in &sites[i + 1..] {
                if a.policy.metadata.scope != b.policy.metadata.scope {
                    continue;
                }
                if !same_shape(a.clause, b.clause) {
                    continue;
                }
                for conflict_type in ConflictType::ALL {
                    if let Some(conflict) = check_pair(conflict_type, a, b) {
                        conflicts.push(conflict);
                    }
                }
            }
        }

        conflicts.sort_by(|x, y| x.sort_key().cmp(&y.sort_key()));
        conflicts.dedup();
        if !conflicts.is_empty() {
            log::debug!("detected {} policy conflict(s)", conflicts.len());
        }
        conflicts
    }
}

fn is_always_true(clause: &CompiledClause) -> bool {
    matches!(
        clause.condition_code(),
        [Instruction::PushConst {
            value: Value::Bool(true)
        }]
    )
}

fn same_shape(a: &CompiledClause, b: &CompiledClause) -> bool {
    is_always_true(a) || is_always_true(b) || a.condition_code() == b.condition_code()
}

fn check_pair(conflict_type: ConflictType, a: &Site<'_>, b: &Site<'_>) -> Option<PolicyConflict> {
    let (left, right) = conflict_type.sides();
    let forward = a.clause.has_action(left) && b.clause.has_action(right);
    let backward = a.clause.has_action(right) && b.clause.has_action(left);
    if !forward && !backward {
        return None;
    }

    let (first, second) = if forward { (left, right) } else { (right, left) };
    let scope = if a.policy.metadata.scope.is_empty() {
        "the global scope".to_string()
    } else {
        let entries: Vec<String> = a
            .policy
            .metadata
            .scope
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("scope {{{}}}", entries.join(", "))
    };
    let explanation = format!(
        "'{}.{}' ({}) and '{}.{}' ({}) match the same condition in {}",
        a.policy.policy_id,
        a.clause.clause_id,
        first,
        b.policy.policy_id,
        b.clause.clause_id,
        second,
        scope
    );

    Some(PolicyConflict {
        conflict_type,
        policy_a: a.policy.policy_id.clone(),
        policy_b: b.policy.policy_id.clone(),
        clause_a: a.clause.clause_id.clone(),
        clause_b: b.clause.clause_id.clone(),
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::PolicyCompiler;
    use warden_parser::parse_policy;

    fn compile(source: &str) -> PolicyIr {
        PolicyCompiler::compile(&parse_policy(source).unwrap()).unwrap()
    }

    #[test]
    fn test_block_versus_always_allow_in_same_scope() {
        let blocker = compile(
            r#"policy blocker { scope: { resource: "payments" }; clause big: amount > 1000 -> BLOCK }"#,
        );
        let allower = compile(
            r#"policy allower { scope: { resource: "payments" }; clause open: true -> ALLOW }"#,
        );

        let conflicts = ConflictDetector::new().detect(&[blocker, allower]);
        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.conflict_type, ConflictType::BlockVersusAllow);
        assert_eq!(conflict.policy_a, "allower");
        assert_eq!(conflict.clause_a, "open");
        assert_eq!(conflict.policy_b, "blocker");
        assert!(conflict.explanation.contains("resource=payments"));
    }

    #[test]
    fn test_different_scope_does_not_conflict() {
        let a = compile(r#"policy a { scope: { resource: "payments" }; clause c: x > 1 -> BLOCK }"#);
        let b = compile(r#"policy b { scope: { resource: "search" }; clause c: x > 1 -> ALLOW }"#);
        assert!(ConflictDetector::new().detect(&[a, b]).is_empty());
    }

    #[test]
    fn test_different_shape_does_not_conflict() {
        let a = compile("policy a { clause c: x > 1 -> BLOCK }");
        let b = compile("policy b { clause c: x > 2 -> ALLOW }");
        assert!(ConflictDetector::new().detect(&[a, b]).is_empty());
    }

    #[test]
    fn test_conflicts_within_one_policy() {
        let ir = compile(
            "policy p {
                clause hold: x > 1 -> REQUIRE_APPROVAL;
                clause stop: x > 1 -> BLOCK;
                clause pass: x > 1 -> ALLOW;
            }",
        );
        let conflicts = ConflictDetector::new().detect(&[ir]);
        let types: Vec<ConflictType> = conflicts.iter().map(|c| c.conflict_type).collect();
        assert_eq!(
            types,
            vec![
                ConflictType::ApprovalVersusAllow,
                ConflictType::BlockVersusApproval,
                ConflictType::BlockVersusAllow,
            ]
        );
    }

    #[test]
    fn test_detection_is_order_independent() {
        let a = compile("policy a { clause c: x > 1 -> BLOCK }");
        let b = compile("policy b { clause c: x > 1 -> ALLOW }");
        let forward = ConflictDetector::new().detect(&[a.clone(), b.clone()]);
        let backward = ConflictDetector::new().detect(&[b, a]);
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 1);
    }
}
