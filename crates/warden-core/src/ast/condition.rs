//! Condition AST nodes

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Comparison operators usable in a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Comparator {
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
}

impl Comparator {
    /// Source symbol of this comparator
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }

    /// Returns true for comparators that require numeric operands
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Comparator::Gt | Comparator::Ge | Comparator::Lt | Comparator::Le
        )
    }

    /// The comparator with its operands swapped (`a > b` is `b < a`)
    pub fn flipped(&self) -> Comparator {
        match self {
            Comparator::Eq => Comparator::Eq,
            Comparator::Ne => Comparator::Ne,
            Comparator::Gt => Comparator::Lt,
            Comparator::Ge => Comparator::Le,
            Comparator::Lt => Comparator::Gt,
            Comparator::Le => Comparator::Ge,
        }
    }

    /// Compare two values without coercion
    ///
    /// Ordering comparators need two numbers; equality needs two values of
    /// the same kind. Returns `None` when the operand kinds do not fit.
    pub fn apply(&self, left: &Value, right: &Value) -> Option<bool> {
        match self {
            Comparator::Eq | Comparator::Ne => {
                if left.kind() != right.kind() {
                    return None;
                }
                let equal = left == right;
                Some(if *self == Comparator::Eq { equal } else { !equal })
            }
            Comparator::Gt | Comparator::Ge | Comparator::Lt | Comparator::Le => {
                let (l, r) = (left.as_f64()?, right.as_f64()?);
                Some(match self {
                    Comparator::Gt => l > r,
                    Comparator::Ge => l >= r,
                    Comparator::Lt => l < r,
                    _ => l <= r,
                })
            }
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Logical connective of a condition group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Condition AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `metric <comparator> literal`
    Predicate {
        metric: String,
        comparator: Comparator,
        value: Value,
    },

    /// `exists(metric)`
    Exists { metric: String },

    /// A group of operands joined by one logical operator
    Logical {
        operator: LogicalOperator,
        operands: Vec<Condition>,
    },

    /// The constant `true` / `false` condition
    Literal(bool),
}

impl Condition {
    /// Create a predicate condition
    pub fn predicate(metric: impl Into<String>, comparator: Comparator, value: Value) -> Self {
        Condition::Predicate {
            metric: metric.into(),
            comparator,
            value,
        }
    }

    /// Create an existence check
    pub fn exists(metric: impl Into<String>) -> Self {
        Condition::Exists {
            metric: metric.into(),
        }
    }

    /// Create an AND group
    pub fn and(operands: Vec<Condition>) -> Self {
        Condition::Logical {
            operator: LogicalOperator::And,
            operands,
        }
    }

    /// Create an OR group
    pub fn or(operands: Vec<Condition>) -> Self {
        Condition::Logical {
            operator: LogicalOperator::Or,
            operands,
        }
    }

    /// Collect every metric name referenced by this condition, sorted
    pub fn metrics(&self) -> BTreeSet<&str> {
        let mut metrics = BTreeSet::new();
        let mut pending = vec![self];
        while let Some(condition) = pending.pop() {
            match condition {
                Condition::Predicate { metric, .. } | Condition::Exists { metric } => {
                    metrics.insert(metric.as_str());
                }
                Condition::Logical { operands, .. } => pending.extend(operands.iter()),
                Condition::Literal(_) => {}
            }
        }
        metrics
    }
}
