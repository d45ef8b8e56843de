//! Unit tests for the Warden DSL front end
//!
//! Covers lexing, parsing and printing of whole policies, plus generated
//! round-trip and determinism laws.

use warden_core::ast::*;
use warden_core::Value;
use warden_parser::*;

const PAYMENTS_POLICY: &str = r#"
# Payments guard rails
policy payments_guard {
    version: "1.4";
    mode: ENFORCE;
    category: SAFETY;
    scope: { resource: "payments" };

    clause large_transfer: amount_usd > 10000 -> BLOCK("transfer too large") halt;
    clause review after large_transfer: amount_usd > 1000 AND exists(new_payee)
        -> REQUIRE_APPROVAL("new payee"), WARN;
    // catch-all
    clause baseline: true -> ALLOW
}
"#;

// =============================================================================
// Lexer Tests
// =============================================================================

#[test]
fn test_lexer_output_ends_with_eof() {
    let tokens = Lexer::tokenize(PAYMENTS_POLICY).unwrap();
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    assert!(tokens.iter().all(|t| t.position.line >= 1));
}

#[test]
fn test_lexer_is_total_over_garbage() {
    for source in ["@@@", "\"open", "1.", "!", "a -- b", "\u{1F600}"] {
        let result = Lexer::tokenize(source);
        assert!(result.is_err(), "expected lex error for {:?}", source);
    }
}

// =============================================================================
// Parser Tests
// =============================================================================

#[test]
fn test_parse_payments_policy() {
    let result = parse_policy(PAYMENTS_POLICY);
    assert!(result.is_ok(), "Failed to parse policy: {:?}", result.err());

    let policy = result.unwrap();
    assert_eq!(policy.metadata.id, "payments_guard");
    assert_eq!(policy.metadata.version, "1.4");
    assert_eq!(policy.metadata.mode, Mode::Enforce);
    assert_eq!(policy.metadata.category, Category::Safety);
    assert_eq!(policy.clauses.len(), 3);

    let large = policy.clause("large_transfer").unwrap();
    assert!(large.halt);
    assert_eq!(
        large.actions,
        vec![Action::Block {
            reason: Some("transfer too large".to_string())
        }]
    );

    let review = policy.clause("review").unwrap();
    assert_eq!(review.after, vec!["large_transfer"]);
    assert_eq!(
        review.condition,
        Condition::and(vec![
            Condition::predicate("amount_usd", Comparator::Gt, Value::Number(1000.0)),
            Condition::exists("new_payee"),
        ])
    );

    let baseline = policy.clause("baseline").unwrap();
    assert_eq!(baseline.condition, Condition::Literal(true));
    assert_eq!(baseline.actions[0].kind(), ActionKind::Allow);
}

#[test]
fn test_parse_policy_set_keeps_declaration_order() {
    let source = r#"
        policy routing_rules { category: ROUTING; }
        policy safety_rules { category: SAFETY; depends_on: [routing_rules]; }
    "#;
    let policies = parse_policy_set(source).unwrap();
    let ids: Vec<&str> = policies.iter().map(|p| p.metadata.id.as_str()).collect();
    assert_eq!(ids, vec!["routing_rules", "safety_rules"]);
    assert_eq!(policies[1].metadata.depends_on, vec!["routing_rules"]);
}

#[test]
fn test_parse_error_positions() {
    let cases = [
        ("policy { }", 1, 8),
        ("policy p {\n  clause c: > 5 -> WARN\n}", 2, 13),
        ("policy p { clause c: a >= \"x\" -> }", 1, 34),
        ("policy p { mode: AUDIT; }", 1, 18),
    ];
    for (source, line, column) in cases {
        let err = parse_policy(source).unwrap_err();
        let position = err.position();
        assert_eq!(
            (position.line, position.column),
            (line, column),
            "wrong position for {:?}: {}",
            source,
            err
        );
    }
}

#[test]
fn test_parse_rejects_unparenthesized_missing_operand() {
    let err = parse_policy("policy p { clause c: a > 1 AND -> WARN }").unwrap_err();
    assert!(matches!(err, ParseError::Unexpected { ref expected, .. } if expected == "condition"));
}

#[test]
fn test_parse_rejects_out_of_range_number() {
    let huge = format!("policy p {{ clause c: a > 1{} -> WARN }}", "0".repeat(400));
    let err = parse_policy(&huge).unwrap_err();
    assert!(matches!(err, ParseError::InvalidNumber { .. }));
}

fn nested(depth: usize) -> String {
    format!(
        "policy p {{ clause c: {}x > 1{} -> WARN }}",
        "(".repeat(depth),
        ")".repeat(depth)
    )
}

#[test]
fn test_parse_accepts_nesting_up_to_the_limit() {
    let ast = parse_policy(&nested(MAX_NESTING_DEPTH)).unwrap();
    assert_eq!(
        ast.clauses[0].condition,
        Condition::predicate("x", Comparator::Gt, Value::Number(1.0))
    );
}

#[test]
fn test_parse_rejects_deep_nesting() {
    for depth in [MAX_NESTING_DEPTH + 1, 600, 100_000] {
        let err = parse_policy(&nested(depth)).unwrap_err();
        match err {
            ParseError::NestingTooDeep { position, limit } => {
                assert_eq!(limit, MAX_NESTING_DEPTH);
                assert_eq!(position.line, 1);
            }
            other => panic!("Expected NestingTooDeep, got {:?}", other),
        }
    }
}

// =============================================================================
// Printer Tests
// =============================================================================

#[test]
fn test_printer_round_trip_for_sample() {
    let ast = parse_policy(PAYMENTS_POLICY).unwrap();
    let printed = to_dsl(&ast);
    assert_eq!(parse_policy(&printed).unwrap(), ast);
    assert_eq!(to_dsl(&parse_policy(&printed).unwrap()), printed);
}

// =============================================================================
// Generated laws
// =============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_name() -> impl Strategy<Value = String> {
        // Prefix keeps generated names clear of keywords
        "[a-z][a-z0-9_]{0,6}".prop_map(|s| format!("m_{}", s))
    }

    fn arb_comparator() -> impl Strategy<Value = Comparator> {
        prop_oneof![
            Just(Comparator::Eq),
            Just(Comparator::Ne),
            Just(Comparator::Gt),
            Just(Comparator::Ge),
            Just(Comparator::Lt),
            Just(Comparator::Le),
        ]
    }

    fn arb_literal() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-40_000i32..40_000).prop_map(|n| Value::Number(f64::from(n) / 4.0)),
            any::<f64>()
                .prop_filter("finite literals", |n| n.is_finite())
                .prop_map(Value::Number),
            "[a-zA-Z \"\\\\\t]{0,8}".prop_map(Value::String),
            any::<bool>().prop_map(Value::Bool),
        ]
    }

    fn arb_condition() -> impl Strategy<Value = Condition> {
        let leaf = prop_oneof![
            (arb_name(), arb_comparator(), arb_literal())
                .prop_map(|(metric, comparator, value)| Condition::predicate(metric, comparator, value)),
            arb_name().prop_map(Condition::exists),
            any::<bool>().prop_map(Condition::Literal),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            (any::<bool>(), prop::collection::vec(inner, 2..4)).prop_map(|(is_and, operands)| {
                if is_and {
                    Condition::and(operands)
                } else {
                    Condition::or(operands)
                }
            })
        })
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        (
            prop_oneof![
                Just(ActionKind::Warn),
                Just(ActionKind::Block),
                Just(ActionKind::RequireApproval),
                Just(ActionKind::Allow),
            ],
            proptest::option::of("[a-z ]{1,12}"),
        )
            .prop_map(|(kind, detail)| Action::of_kind(kind, detail))
    }

    fn arb_policy() -> impl Strategy<Value = PolicyAst> {
        (
            arb_name(),
            prop_oneof![Just(Mode::Monitor), Just(Mode::Enforce)],
            prop::sample::select(Category::ALL.to_vec()),
            prop::collection::vec(
                (arb_condition(), prop::collection::vec(arb_action(), 1..3), any::<bool>()),
                0..4,
            ),
        )
            .prop_map(|(id, mode, category, clauses)| {
                let metadata = PolicyMetadata::new(id).with_mode(mode).with_category(category);
                let clauses = clauses
                    .into_iter()
                    .enumerate()
                    .map(|(i, (condition, actions, halt))| {
                        let clause = Clause::new(format!("c{}", i), condition, actions);
                        if halt {
                            clause.halting()
                        } else {
                            clause
                        }
                    })
                    .collect();
                PolicyAst::new(metadata, clauses)
            })
    }

    proptest! {
        #[test]
        fn parse_of_printed_policy_round_trips(policy in arb_policy()) {
            let printed = to_dsl(&policy);
            let parsed = parse_policy(&printed);
            prop_assert!(parsed.is_ok(), "printed policy failed to parse: {}", printed);
            prop_assert_eq!(parsed.unwrap(), policy);
        }

        #[test]
        fn parse_is_deterministic(policy in arb_policy()) {
            let source = to_dsl(&policy);
            let first = parse_policy(&source).unwrap();
            let second = parse_policy(&source).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(to_dsl(&first), source);
        }
    }
}
