//! DSL printer
//!
//! Serializes a `PolicyAst` back into DSL text that parses to the same AST.
//! Output is canonical: fixed header order, four-space indent, one clause per
//! line.

use std::fmt::Write;
use warden_core::ast::{Action, Clause, Condition, LogicalOperator, PolicyAst};
use warden_core::Value;

/// Render a policy as DSL source
pub fn to_dsl(policy: &PolicyAst) -> String {
    let meta = &policy.metadata;
    let mut out = String::new();

    let _ = writeln!(out, "policy {} {{", meta.id);
    let _ = writeln!(out, "    version: {};", quote(&meta.version));
    let _ = writeln!(out, "    mode: {};", meta.mode);
    let _ = writeln!(out, "    category: {};", meta.category);
    if !meta.scope.is_empty() {
        let entries: Vec<String> = meta
            .scope
            .iter()
            .map(|(key, value)| format!("{}: {}", key, quote(value)))
            .collect();
        let _ = writeln!(out, "    scope: {{ {} }};", entries.join(", "));
    }
    if !meta.depends_on.is_empty() {
        let _ = writeln!(out, "    depends_on: [{}];", meta.depends_on.join(", "));
    }

    for clause in &policy.clauses {
        out.push_str("    ");
        write_clause(&mut out, clause);
        out.push('\n');
    }

    out.push_str("}\n");
    out
}

fn write_clause(out: &mut String, clause: &Clause) {
    let _ = write!(out, "clause {}", clause.id);
    if !clause.after.is_empty() {
        let _ = write!(out, " after {}", clause.after.join(", "));
    }
    out.push_str(": ");
    write_condition(out, &clause.condition);
    out.push_str(" -> ");

    let actions: Vec<String> = clause.actions.iter().map(render_action).collect();
    out.push_str(&actions.join(", "));
    if clause.halt {
        out.push_str(" halt");
    }
    out.push(';');
}

fn render_action(action: &Action) -> String {
    match action.detail() {
        Some(detail) => format!("{}({})", action.kind(), quote(detail)),
        None => action.kind().keyword().to_string(),
    }
}

fn write_condition(out: &mut String, condition: &Condition) {
    match condition {
        Condition::Predicate {
            metric,
            comparator,
            value,
        } => {
            let _ = write!(out, "{} {} {}", metric, comparator, render_value(value));
        }
        Condition::Exists { metric } => {
            let _ = write!(out, "exists({})", metric);
        }
        Condition::Literal(b) => {
            let _ = write!(out, "{}", b);
        }
        Condition::Logical { operator, operands } => {
            // An empty group prints as its identity element
            if operands.is_empty() {
                out.push_str(match operator {
                    LogicalOperator::And => "true",
                    LogicalOperator::Or => "false",
                });
                return;
            }
            for (i, operand) in operands.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, " {} ", operator.keyword());
                }
                if needs_parens(*operator, operand) {
                    out.push('(');
                    write_condition(out, operand);
                    out.push(')');
                } else {
                    write_condition(out, operand);
                }
            }
        }
    }
}

/// A nested group keeps its shape unless it is an AND inside an OR
fn needs_parens(parent: LogicalOperator, child: &Condition) -> bool {
    match child {
        Condition::Logical { operator, operands } if operands.len() > 1 => {
            !(parent == LogicalOperator::Or && *operator == LogicalOperator::And)
        }
        Condition::Logical { .. } => true,
        _ => false,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        other => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_policy;

    #[test]
    fn test_print_minimal_policy() {
        let ast = parse_policy("policy p1 { mode: ENFORCE; clause c1: cost_usd > 100 -> BLOCK }")
            .unwrap();
        let expected = "policy p1 {\n    version: \"1\";\n    mode: ENFORCE;\n    category: CUSTOM;\n    clause c1: cost_usd > 100 -> BLOCK;\n}\n";
        assert_eq!(to_dsl(&ast), expected);
    }

    #[test]
    fn test_print_keeps_grouping() {
        let source = "policy p { clause c: (a > 1 OR b > 2) AND c > 3 OR exists(d) -> WARN }";
        let ast = parse_policy(source).unwrap();
        let printed = to_dsl(&ast);
        assert!(printed.contains("(a > 1 OR b > 2) AND c > 3 OR exists(d)"));
        assert_eq!(parse_policy(&printed).unwrap(), ast);
    }

    #[test]
    fn test_print_nested_same_operator() {
        let ast = parse_policy("policy p { clause c: a > 1 AND (b > 2 AND c > 3) -> WARN }")
            .unwrap();
        let printed = to_dsl(&ast);
        assert!(printed.contains("a > 1 AND (b > 2 AND c > 3)"));
        assert_eq!(parse_policy(&printed).unwrap(), ast);
    }

    #[test]
    fn test_print_escapes_strings() {
        let source = r#"policy p { clause c: note == "say \"hi\"\n" -> WARN("tab\there") }"#;
        let ast = parse_policy(source).unwrap();
        let printed = to_dsl(&ast);
        assert!(printed.contains(r#"note == "say \"hi\"\n""#));
        assert_eq!(parse_policy(&printed).unwrap(), ast);
    }

    #[test]
    fn test_print_full_header_and_clause_extras() {
        let source = r#"
            policy guard {
                version: "3";
                mode: MONITOR;
                category: PRIVACY;
                scope: { resource: "payments", region: "eu" };
                depends_on: [base];
                clause a: true -> ALLOW;
                clause b after a: score >= 0.75 -> REQUIRE_APPROVAL("review"), WARN halt;
            }
        "#;
        let ast = parse_policy(source).unwrap();
        let printed = to_dsl(&ast);
        assert!(printed.contains("scope: { region: \"eu\", resource: \"payments\" };"));
        assert!(printed.contains("depends_on: [base];"));
        assert!(printed.contains(
            "clause b after a: score >= 0.75 -> REQUIRE_APPROVAL(\"review\"), WARN halt;"
        ));
        assert_eq!(parse_policy(&printed).unwrap(), ast);
    }
}
