//! Policy validator
//!
//! Checks a `PolicyAst` against the language rules before compilation. The
//! validator never mutates the AST and never fails: every finding becomes a
//! `ValidationIssue`. Error-severity issues block compilation, warnings do
//! not.
//!
//! | id   | severity | rule |
//! |------|----------|------|
//! | V001 | error    | duplicate clause id |
//! | V002 | error    | clause without actions |
//! | V003 | error    | ordering comparator against a non-numeric literal |
//! | V004 | error    | logical condition without operands |
//! | V005 | error    | `after` references an unknown clause or itself |
//! | V006 | error    | ENFORCE policy reads a metric outside the metric mapping |
//! | V007 | error    | clause both blocks and allows |
//! | V008 | error    | empty policy or clause id |
//! | W001 | warning  | clause id is not lower snake case |
//! | W002 | warning  | MONITOR policy with a BLOCK action |
//! | W003 | warning  | duplicate action kind in one clause |
//! | W004 | warning  | logical condition with a single operand |
//! | W005 | warning  | MONITOR policy reads a metric outside the metric mapping |
//! | W006 | warning  | policy without clauses |
//! | W007 | warning  | condition is the literal `false` |

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use warden_core::ast::{ActionKind, Clause, Condition, Mode, PolicyAst};
use warden_core::Value;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,

    /// Rule identifier (e.g. "V001", "W002")
    pub rule_id: String,

    pub message: String,

    /// Clause the issue belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clause_id: Option<String>,
}

/// Outcome of validating one policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

/// Environment the policy is validated against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    /// Metrics the fact pipeline can supply; `None` disables the mapping checks
    #[serde(default)]
    pub known_metrics: Option<BTreeSet<String>>,
}

impl ValidationIssue {
    pub fn error(rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            rule_id: rule_id.to_string(),
            message: message.into(),
            clause_id: None,
        }
    }

    pub fn warning(rule_id: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            rule_id: rule_id.to_string(),
            message: message.into(),
            clause_id: None,
        }
    }

    pub fn in_clause(mut self, clause_id: impl Into<String>) -> Self {
        self.clause_id = Some(clause_id.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.clause_id {
            Some(clause_id) => write!(f, "[{}] clause '{}': {}", self.rule_id, clause_id, self.message),
            None => write!(f, "[{}] {}", self.rule_id, self.message),
        }
    }
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// True when there is nothing to report at all
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if any issue carries the given rule id
    pub fn has_rule(&self, rule_id: &str) -> bool {
        self.issues.iter().any(|i| i.rule_id == rule_id)
    }
}

impl ValidationContext {
    /// Context with a metric mapping
    pub fn with_known_metrics<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_metrics: Some(metrics.into_iter().map(Into::into).collect()),
        }
    }
}

/// Stateless policy validator
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a policy, collecting every issue
    pub fn validate(&self, policy: &PolicyAst, context: &ValidationContext) -> ValidationResult {
        let mut issues = Vec::new();
        let meta = &policy.metadata;

        if meta.id.is_empty() {
            issues.push(ValidationIssue::error("V008", "policy id is empty"));
        }
        if policy.clauses.is_empty() {
            issues.push(ValidationIssue::warning(
                "W006",
                format!("policy '{}' has no clauses", meta.id),
            ));
        }

        let clause_ids: HashSet<&str> = policy.clauses.iter().map(|c| c.id.as_str()).collect();
        let mut seen = HashSet::new();
        for clause in &policy.clauses {
            if !seen.insert(clause.id.as_str()) {
                issues.push(
                    ValidationIssue::error("V001", format!("duplicate clause id '{}'", clause.id))
                        .in_clause(&clause.id),
                );
            }
            self.validate_clause(clause, meta.mode, &clause_ids, context, &mut issues);
        }

        log::debug!(
            "validated policy '{}': {} issue(s)",
            meta.id,
            issues.len()
        );
        ValidationResult { issues }
    }

    fn validate_clause(
        &self,
        clause: &Clause,
        mode: Mode,
        clause_ids: &HashSet<&str>,
        context: &ValidationContext,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let mut push = |issue: ValidationIssue| issues.push(issue.in_clause(&clause.id));

        if clause.id.is_empty() {
            push(ValidationIssue::error("V008", "clause id is empty"));
        } else if !is_snake_case(&clause.id) {
            push(ValidationIssue::warning(
                "W001",
                format!("clause id '{}' is not lower snake case", clause.id),
            ));
        }

        // Actions
        if clause.actions.is_empty() {
            push(ValidationIssue::error("V002", "clause has no actions"));
        }
        let kinds: Vec<ActionKind> = clause.actions.iter().map(|a| a.kind()).collect();
        if kinds.contains(&ActionKind::Block) && kinds.contains(&ActionKind::Allow) {
            push(ValidationIssue::error(
                "V007",
                "clause both blocks and allows the same operation",
            ));
        }
        let mut seen_kinds = BTreeSet::new();
        for kind in &kinds {
            if !seen_kinds.insert(*kind) {
                push(ValidationIssue::warning(
                    "W003",
                    format!("action {} appears more than once", kind),
                ));
            }
        }
        if mode == Mode::Monitor && kinds.contains(&ActionKind::Block) {
            push(ValidationIssue::warning(
                "W002",
                "BLOCK in a MONITOR policy is reported but never enforced",
            ));
        }

        // Dependencies
        for dependency in &clause.after {
            if dependency == &clause.id {
                push(ValidationIssue::error("V005", "clause cannot run after itself"));
            } else if !clause_ids.contains(dependency.as_str()) {
                push(ValidationIssue::error(
                    "V005",
                    format!("'after' references unknown clause '{}'", dependency),
                ));
            }
        }

        // Condition
        if clause.condition == Condition::Literal(false) {
            push(ValidationIssue::warning("W007", "condition is always false"));
        }
        check_condition(&clause.condition, &mut push);

        if let Some(known) = &context.known_metrics {
            for metric in clause.condition.metrics() {
                if known.contains(metric) {
                    continue;
                }
                let message = format!("metric '{}' is not in the metric mapping", metric);
                push(match mode {
                    Mode::Enforce => ValidationIssue::error("V006", message),
                    Mode::Monitor => ValidationIssue::warning("W005", message),
                });
            }
        }
    }
}

/// Structural checks over every node of a condition tree
fn check_condition(condition: &Condition, push: &mut impl FnMut(ValidationIssue)) {
    let mut pending = vec![condition];
    while let Some(node) = pending.pop() {
        match node {
            Condition::Predicate {
                metric,
                comparator,
                value,
            } => {
                if comparator.is_ordering() && !matches!(value, Value::Number(_)) {
                    push(ValidationIssue::error(
                        "V003",
                        format!(
                            "'{} {} {}' compares against a {} literal, expected a number",
                            metric,
                            comparator,
                            value,
                            value.kind()
                        ),
                    ));
                }
            }
            Condition::Logical { operator, operands } => {
                match operands.len() {
                    0 => push(ValidationIssue::error(
                        "V004",
                        format!("{} group has no operands", operator.keyword()),
                    )),
                    1 => push(ValidationIssue::warning(
                        "W004",
                        format!("{} group has a single operand", operator.keyword()),
                    )),
                    _ => {}
                }
                pending.extend(operands.iter());
            }
            Condition::Exists { .. } | Condition::Literal(_) => {}
        }
    }
}

fn is_snake_case(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
