//! Dead-clause elimination
//!
//! Rebuilds each clause condition symbolically from its postfix code and
//! drops clauses that can never match, whatever the facts:
//! - the constant `false`, or a constant comparison that is false
//! - an AND with an operand that can never hold
//! - an OR whose operands can never hold
//! - an AND whose predicates on one metric cannot hold together, such as
//!   `cost > 100 AND cost < 50` or `region == "eu" AND region == "us"`
//!
//! Every removal is reported. Dependencies on a removed clause are dropped
//! from the remaining clauses and reported as well.

use super::{DiagnosticKind, OptimizationPass, OptimizerDiagnostic, PassOutput};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use warden_core::ast::Comparator;
use warden_core::ir::{CompiledClause, Instruction, PolicyIr};
use warden_core::Value;

const PASS: &str = "dead_clause_elimination";

/// Dead-clause eliminator
#[derive(Debug, Clone, Copy, Default)]
pub struct DeadClauseEliminator;

/// Symbolic form of a condition program
#[derive(Debug, Clone, PartialEq)]
enum Sym {
    Const(Value),
    Fact(String),
    Exists(String),
    Compare {
        left: Box<Sym>,
        comparator: Comparator,
        right: Box<Sym>,
    },
    And(Box<Sym>, Box<Sym>),
    Or(Box<Sym>, Box<Sym>),
}

impl DeadClauseEliminator {
    pub fn new() -> Self {
        Self
    }

    /// Returns true if the clause can never match
    pub fn is_dead(&self, clause: &CompiledClause) -> bool {
        rebuild(clause.condition_code())
            .map(|sym| never_holds(&sym))
            .unwrap_or(false)
    }
}

impl OptimizationPass for DeadClauseEliminator {
    fn name(&self) -> &'static str {
        PASS
    }

    fn run(&self, ir: &PolicyIr) -> Result<PassOutput> {
        let mut diagnostics = Vec::new();
        let mut removed = BTreeSet::new();

        for clause in &ir.clauses {
            if self.is_dead(clause) {
                log::warn!(
                    "policy '{}': removing clause '{}', its condition can never hold",
                    ir.policy_id,
                    clause.clause_id
                );
                diagnostics.push(OptimizerDiagnostic::new(
                    PASS,
                    Some(&clause.clause_id),
                    DiagnosticKind::ClauseRemoved,
                    "condition can never hold; clause removed",
                ));
                removed.insert(clause.clause_id.clone());
            }
        }

        if removed.is_empty() {
            return Ok((ir.clone(), diagnostics));
        }

        let mut kept = Vec::with_capacity(ir.clauses.len() - removed.len());
        for clause in ir.clauses.iter().filter(|c| !removed.contains(&c.clause_id)) {
            let mut clause = clause.clone();
            let (dropped, after): (Vec<String>, Vec<String>) =
                clause.after.into_iter().partition(|dep| removed.contains(dep));
            for dependency in dropped {
                diagnostics.push(OptimizerDiagnostic::new(
                    PASS,
                    Some(&clause.clause_id),
                    DiagnosticKind::DependencyDropped,
                    format!("dependency on removed clause '{}' dropped", dependency),
                ));
            }
            clause.after = after;
            kept.push(clause);
        }

        Ok((ir.with_clauses(kept)?, diagnostics))
    }
}

/// Rebuild the expression tree of a postfix program
///
/// Returns `None` for programs that do not leave exactly one value; the
/// interpreter reports those at evaluation time.
fn rebuild(code: &[Instruction]) -> Option<Sym> {
    let mut stack: Vec<Sym> = Vec::new();
    for instruction in code {
        let sym = match instruction {
            Instruction::PushConst { value } => Sym::Const(value.clone()),
            Instruction::PushFact { metric } => Sym::Fact(metric.clone()),
            Instruction::ExistsCheck { metric } => Sym::Exists(metric.clone()),
            Instruction::Compare { comparator } => {
                let right = stack.pop()?;
                let left = stack.pop()?;
                Sym::Compare {
                    left: Box::new(left),
                    comparator: *comparator,
                    right: Box::new(right),
                }
            }
            Instruction::And | Instruction::Or => {
                let right = Box::new(stack.pop()?);
                let left = Box::new(stack.pop()?);
                if *instruction == Instruction::And {
                    Sym::And(left, right)
                } else {
                    Sym::Or(left, right)
                }
            }
            Instruction::PolicyCheck { .. } | Instruction::HaltMatch => return None,
        };
        stack.push(sym);
    }
    match (stack.pop(), stack.is_empty()) {
        (Some(sym), true) => Some(sym),
        _ => None,
    }
}

fn never_holds(sym: &Sym) -> bool {
    match sym {
        Sym::Const(value) => *value == Value::Bool(false),
        Sym::Compare {
            left,
            comparator,
            right,
        } => match (left.as_ref(), right.as_ref()) {
            (Sym::Const(l), Sym::Const(r)) => comparator.apply(l, r) == Some(false),
            _ => false,
        },
        Sym::And(left, right) => {
            never_holds(left) || never_holds(right) || conjunction_unsatisfiable(sym)
        }
        Sym::Or(left, right) => never_holds(left) && never_holds(right),
        Sym::Fact(_) | Sym::Exists(_) => false,
    }
}

/// Constraints a conjunction places on one metric
#[derive(Debug, Default)]
struct MetricConstraints {
    /// (bound, inclusive)
    lower: Option<(f64, bool)>,
    upper: Option<(f64, bool)>,
    equals: Vec<Value>,
    not_equals: Vec<Value>,
}

impl MetricConstraints {
    fn add(&mut self, comparator: Comparator, value: &Value) {
        match comparator {
            Comparator::Eq => {
                if let Some(n) = value.as_f64() {
                    self.tighten_lower(n, true);
                    self.tighten_upper(n, true);
                }
                self.equals.push(value.clone());
            }
            Comparator::Ne => self.not_equals.push(value.clone()),
            Comparator::Gt | Comparator::Ge | Comparator::Lt | Comparator::Le => {
                let Some(n) = value.as_f64() else { return };
                match comparator {
                    Comparator::Gt => self.tighten_lower(n, false),
                    Comparator::Ge => self.tighten_lower(n, true),
                    Comparator::Lt => self.tighten_upper(n, false),
                    _ => self.tighten_upper(n, true),
                }
            }
        }
    }

    fn tighten_lower(&mut self, bound: f64, inclusive: bool) {
        let tighter = match self.lower {
            None => true,
            Some((current, current_inclusive)) => {
                bound > current || (bound == current && current_inclusive && !inclusive)
            }
        };
        if tighter {
            self.lower = Some((bound, inclusive));
        }
    }

    fn tighten_upper(&mut self, bound: f64, inclusive: bool) {
        let tighter = match self.upper {
            None => true,
            Some((current, current_inclusive)) => {
                bound < current || (bound == current && current_inclusive && !inclusive)
            }
        };
        if tighter {
            self.upper = Some((bound, inclusive));
        }
    }

    fn unsatisfiable(&self) -> bool {
        if let Some(first) = self.equals.first() {
            if self.equals.iter().any(|other| other != first) {
                return true;
            }
            if self.not_equals.contains(first) {
                return true;
            }
        }

        if let (Some((low, low_inclusive)), Some((high, high_inclusive))) = (self.lower, self.upper)
        {
            if low > high {
                return true;
            }
            if low == high {
                if !(low_inclusive && high_inclusive) {
                    return true;
                }
                if self.not_equals.contains(&Value::Number(low)) {
                    return true;
                }
            }
        }
        false
    }
}

fn conjunction_unsatisfiable(sym: &Sym) -> bool {
    let mut constraints: BTreeMap<&str, MetricConstraints> = BTreeMap::new();
    let mut pending = vec![sym];

    while let Some(node) = pending.pop() {
        match node {
            Sym::And(left, right) => {
                pending.push(left);
                pending.push(right);
            }
            Sym::Compare {
                left,
                comparator,
                right,
            } => {
                let (metric, comparator, value) = match (left.as_ref(), right.as_ref()) {
                    (Sym::Fact(metric), Sym::Const(value)) => (metric, *comparator, value),
                    (Sym::Const(value), Sym::Fact(metric)) => (metric, comparator.flipped(), value),
                    _ => continue,
                };
                constraints
                    .entry(metric.as_str())
                    .or_default()
                    .add(comparator, value);
            }
            _ => {}
        }
    }

    constraints.values().any(MetricConstraints::unsatisfiable)
}
