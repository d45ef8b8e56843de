//! Dependency-aware ordering
//!
//! Builds `ExecutionDag`s for policies and clauses. Policies are ranked by
//! category (SAFETY first) and ordered after their `depends_on` entries;
//! clauses are ordered after their `after` entries. Ties break on the id, so
//! the order is total and stable. A cycle is a hard failure.

use super::{DiagnosticKind, OptimizationPass, OptimizerDiagnostic, PassOutput};
use crate::error::Result;
use warden_core::ir::{ExecutionDag, ExecutionNode, PolicyIr};
use warden_core::DagError;

const PASS: &str = "clause_ordering";

/// Execution DAG over a set of policies
pub fn policy_dag(policies: &[PolicyIr]) -> std::result::Result<ExecutionDag, DagError> {
    let nodes = policies
        .iter()
        .map(|ir| {
            ir.metadata.depends_on.iter().fold(
                ExecutionNode::new(&ir.policy_id, ir.metadata.category.priority()),
                |node, dependency| node.depends_on(dependency),
            )
        })
        .collect();
    ExecutionDag::build(nodes)
}

/// Reorder a policy's clauses so every clause follows its `after` entries
pub fn order_clauses(ir: &PolicyIr) -> Result<PolicyIr> {
    let nodes = ir
        .clauses
        .iter()
        .map(|clause| {
            clause.after.iter().fold(
                ExecutionNode::new(&clause.clause_id, 0),
                |node, dependency| node.depends_on(dependency),
            )
        })
        .collect();
    let dag = ExecutionDag::build(nodes)?;

    let mut ordered = Vec::with_capacity(ir.clauses.len());
    for id in dag.order() {
        if let Some(clause) = ir.clause(id) {
            ordered.push(clause.clone());
        }
    }
    Ok(ir.with_clauses(ordered)?)
}

/// The clause ordering pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseOrdering;

impl ClauseOrdering {
    pub fn new() -> Self {
        Self
    }
}

impl OptimizationPass for ClauseOrdering {
    fn name(&self) -> &'static str {
        PASS
    }

    fn run(&self, ir: &PolicyIr) -> Result<PassOutput> {
        let ordered = order_clauses(ir)?;
        let before: Vec<&str> = ir.clauses.iter().map(|c| c.clause_id.as_str()).collect();
        let after: Vec<&str> = ordered.clauses.iter().map(|c| c.clause_id.as_str()).collect();

        if before == after {
            return Ok((ir.clone(), Vec::new()));
        }

        let diagnostic = OptimizerDiagnostic::new(
            PASS,
            None,
            DiagnosticKind::Reordered,
            format!("clause order is now {}", after.join(", ")),
        );
        Ok((ordered, vec![diagnostic]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::PolicyCompiler;
    use crate::error::CompileError;
    use warden_parser::parse_policy;

    fn compile(source: &str) -> PolicyIr {
        PolicyCompiler::compile(&parse_policy(source).unwrap()).unwrap()
    }

    #[test]
    fn test_policy_dag_uses_category_priority() {
        let policies = vec![
            compile("policy zeta { category: CUSTOM; }"),
            compile("policy alpha { category: ROUTING; }"),
            compile("policy guard { category: SAFETY; }"),
            compile("policy pii { category: PRIVACY; }"),
        ];
        let dag = policy_dag(&policies).unwrap();
        assert_eq!(dag.order(), &["guard", "pii", "alpha", "zeta"]);
    }

    #[test]
    fn test_policy_dag_honours_depends_on() {
        let policies = vec![
            compile("policy guard { category: SAFETY; depends_on: [enrich]; }"),
            compile("policy enrich { category: CUSTOM; }"),
        ];
        let dag = policy_dag(&policies).unwrap();
        assert_eq!(dag.order(), &["enrich", "guard"]);
    }

    #[test]
    fn test_policy_cycle_is_rejected() {
        let policies = vec![
            compile("policy a { depends_on: [b]; }"),
            compile("policy b { depends_on: [a]; }"),
        ];
        let err = policy_dag(&policies).unwrap_err();
        assert_eq!(
            err,
            DagError::Cycle {
                participants: vec!["a".to_string(), "b".to_string()]
            }
        );
    }

    #[test]
    fn test_order_clauses() {
        let ir = compile(
            "policy p {
                clause late after mid: x > 3 -> WARN;
                clause mid after early: x > 2 -> WARN;
                clause early: x > 1 -> WARN;
                clause aside: x > 0 -> WARN;
            }",
        );
        let ordered = order_clauses(&ir).unwrap();
        let ids: Vec<&str> = ordered.clauses.iter().map(|c| c.clause_id.as_str()).collect();
        assert_eq!(ids, vec!["aside", "early", "mid", "late"]);
        assert!(ordered.verify_hash().unwrap());
    }

    #[test]
    fn test_clause_cycle_is_hard_failure() {
        let ir = compile(
            "policy p {
                clause a after b: x > 1 -> WARN;
                clause b after a: x > 2 -> WARN;
            }",
        );
        let err = ClauseOrdering::new().run(&ir).unwrap_err();
        assert!(matches!(err, CompileError::Dag(DagError::Cycle { .. })));
    }

    #[test]
    fn test_unchanged_order_reports_nothing() {
        let ir = compile("policy p { clause a: x > 1 -> WARN; clause b: x > 2 -> WARN; }");
        let (ordered, diagnostics) = ClauseOrdering::new().run(&ir).unwrap();
        assert_eq!(ordered, ir);
        assert!(diagnostics.is_empty());
    }
}
