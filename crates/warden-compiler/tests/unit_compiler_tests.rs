//! Compiler integration tests
//!
//! Drive the full front half of the pipeline from DSL source to optimized IR.

use warden_compiler::optimizer::dag_sort::policy_dag;
use warden_compiler::{
    CompileError, Compiler, CompilerOptions, ConflictDetector, ConflictType, DiagnosticKind,
    PassSet, ValidationContext,
};
use warden_core::ast::{ActionKind, Comparator, Mode};
use warden_core::ir::{Instruction, PolicyIr};
use warden_core::{DagError, Value};

fn compile(source: &str) -> PolicyIr {
    Compiler::new().compile_source(source).unwrap()
}

// ===== End-to-end IR =====

#[test]
fn test_single_predicate_policy() {
    let ir = compile("policy p1 { mode: ENFORCE; clause c1: cost_usd > 100 -> BLOCK }");

    assert_eq!(ir.policy_id, "p1");
    assert_eq!(ir.metadata.mode, Mode::Enforce);
    assert_eq!(ir.metadata.version, "1");
    assert_eq!(ir.clauses.len(), 1);

    let clause = &ir.clauses[0];
    assert_eq!(clause.clause_id, "c1");
    assert_eq!(
        clause.instructions,
        vec![
            Instruction::PushFact {
                metric: "cost_usd".to_string()
            },
            Instruction::PushConst {
                value: Value::Number(100.0)
            },
            Instruction::Compare {
                comparator: Comparator::Gt
            },
            Instruction::HaltMatch,
        ]
    );
    assert_eq!(clause.actions.len(), 1);
    assert_eq!(clause.actions[0].kind, ActionKind::Block);
    assert!(ir.verify_hash().unwrap());
}

#[test]
fn test_scope_becomes_guards() {
    let ir = compile(
        r#"policy p { scope: { tenant: "acme", resource: "payments" }; clause c: x > 1 -> WARN }"#,
    );
    let guards = ir.clauses[0].guards();
    assert_eq!(guards.len(), 2);
    // Scope keys are emitted in sorted order
    assert_eq!(
        guards[0],
        Instruction::PolicyCheck {
            key: "resource".to_string(),
            expected: "payments".to_string()
        }
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let source = r#"
        policy spend {
            mode: ENFORCE;
            category: OPERATIONAL;
            clause huge: cost_usd > 1000 OR (tokens > 50000 AND model == "large") -> BLOCK("too big");
            clause big after huge: cost_usd > 100 -> REQUIRE_APPROVAL, WARN("big spend");
        }
    "#;
    let first = compile(source);
    let second = compile(source);
    assert_eq!(first, second);
    assert_eq!(first.ir_hash, second.ir_hash);
    assert_eq!(first.to_canonical_json().unwrap(), second.to_canonical_json().unwrap());
}

#[test]
fn test_hash_changes_with_content() {
    let a = compile("policy p { clause c: x > 1 -> WARN }");
    let b = compile("policy p { clause c: x > 2 -> WARN }");
    assert_ne!(a.ir_hash, b.ir_hash);
}

#[test]
fn test_ir_survives_json_transport() {
    let ir = compile(r#"policy p { mode: ENFORCE; clause c: region == "eu" -> BLOCK("no") }"#);
    let restored = PolicyIr::from_json(&ir.to_canonical_json().unwrap()).unwrap();
    assert_eq!(restored, ir);
    assert!(restored.verify_hash().unwrap());
}

// ===== Validation =====

#[test]
fn test_validation_errors_abort() {
    let err = Compiler::new()
        .compile_source("policy p { clause a: x > 1 -> WARN; clause a: x > 2 -> WARN }")
        .unwrap_err();
    match err {
        CompileError::Validation { issues } => {
            assert!(issues.iter().any(|issue| issue.rule_id == "V001"));
            assert!(issues.iter().all(|issue| issue.is_error()));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_metric_mapping_enforced_in_enforce_mode() {
    let compiler = Compiler::with_options(CompilerOptions {
        validation: ValidationContext::with_known_metrics(["cost_usd"]),
        ..CompilerOptions::default()
    });

    let err = compiler
        .compile_source("policy p { mode: ENFORCE; clause c: latency_ms > 10 -> BLOCK }")
        .unwrap_err();
    assert!(err.to_string().contains("V006"));

    // Monitor policies only warn
    assert!(compiler
        .compile_source("policy p { clause c: latency_ms > 10 -> WARN }")
        .is_ok());
}

// ===== Optimization =====

#[test]
fn test_constant_conditions_are_folded() {
    let compilation = Compiler::new()
        .compile(&warden_parser::parse_policy("policy p { clause c: true OR false -> WARN }").unwrap())
        .unwrap();
    assert_eq!(
        compilation.ir.clauses[0].condition_code(),
        &[Instruction::PushConst {
            value: Value::Bool(true)
        }]
    );
    assert!(compilation
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::Folded));
}

#[test]
fn test_dead_clauses_are_removed() {
    let compilation = Compiler::new()
        .compile(
            &warden_parser::parse_policy(
                "policy p {
                    clause never: cost > 100 AND cost < 50 -> WARN;
                    clause live: cost > 1 -> WARN;
                }",
            )
            .unwrap(),
        )
        .unwrap();
    let ids: Vec<&str> = compilation
        .ir
        .clauses
        .iter()
        .map(|c| c.clause_id.as_str())
        .collect();
    assert_eq!(ids, vec!["live"]);
    assert!(compilation
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::ClauseRemoved));
}

#[test]
fn test_passes_can_be_disabled() {
    let compiler = Compiler::with_options(CompilerOptions {
        passes: PassSet::none(),
        ..CompilerOptions::default()
    });
    let ir = compiler
        .compile_source("policy p { clause c: true OR false -> WARN; clause d: false -> WARN }")
        .unwrap();
    assert_eq!(ir.clauses.len(), 2);
    assert_eq!(ir.clauses[0].condition_code().len(), 3);
}

#[test]
fn test_optimization_preserves_hash_integrity() {
    let ir = compile(
        "policy p {
            clause b after a: (true OR false) AND x > 2 -> WARN;
            clause a: x > 1 -> WARN;
        }",
    );
    assert_eq!(ir.clauses[0].clause_id, "a");
    assert!(ir.verify_hash().unwrap());
}

#[test]
fn test_clause_cycle_fails_compilation() {
    let compiler = Compiler::with_options(CompilerOptions {
        enable_validation: false,
        ..CompilerOptions::default()
    });
    let err = compiler
        .compile_source("policy p { clause a after b: x > 1 -> WARN; clause b after a: x > 2 -> WARN }")
        .unwrap_err();
    assert!(matches!(err, CompileError::Dag(DagError::Cycle { .. })));
}

// ===== Cross-policy analysis =====

#[test]
fn test_block_and_allow_conflict() {
    let policies = Compiler::new()
        .compile_source_set(
            r#"
            policy blocker { scope: { resource: "payments" }; clause big: amount > 1000 -> BLOCK; }
            policy allower { scope: { resource: "payments" }; clause open: true -> ALLOW; }
            "#,
        )
        .unwrap();
    let conflicts = ConflictDetector::new().detect(&policies);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].conflict_type, ConflictType::BlockVersusAllow);
    assert_eq!(
        (conflicts[0].policy_a.as_str(), conflicts[0].policy_b.as_str()),
        ("allower", "blocker")
    );
}

#[test]
fn test_policy_dependency_cycle() {
    let policies = Compiler::new()
        .compile_source_set("policy a { depends_on: [b]; } policy b { depends_on: [a]; }")
        .unwrap();
    let err = policy_dag(&policies).unwrap_err();
    assert!(err.to_string().contains("a, b"));
}

#[test]
fn test_policy_unknown_dependency() {
    let policies = Compiler::new()
        .compile_source_set("policy a { depends_on: [ghost]; }")
        .unwrap();
    assert_eq!(
        policy_dag(&policies).unwrap_err(),
        DagError::UnknownDependency {
            node: "a".to_string(),
            dependency: "ghost".to_string()
        }
    );
}
