//! Condition compiler
//!
//! Lowers a `Condition` tree into a postfix program that leaves exactly one
//! boolean on the stack. Logical groups are left-folded into binary
//! operations, so `AND(a, b, c)` becomes `a b And c And`. Literal values are
//! inlined; facts are always read at evaluation time.

use crate::error::{CompileError, Result};
use warden_core::ast::{Condition, LogicalOperator};
use warden_core::ir::Instruction;
use warden_core::Value;

/// Condition compiler
pub struct ConditionCompiler;

impl ConditionCompiler {
    /// Compile a condition into postfix instructions
    pub fn compile(condition: &Condition) -> Result<Vec<Instruction>> {
        let mut instructions = Vec::new();
        Self::emit(condition, &mut instructions)?;
        Ok(instructions)
    }

    fn emit(condition: &Condition, out: &mut Vec<Instruction>) -> Result<()> {
        match condition {
            Condition::Predicate {
                metric,
                comparator,
                value,
            } => {
                out.push(Instruction::PushFact {
                    metric: metric.clone(),
                });
                out.push(Instruction::PushConst {
                    value: value.clone(),
                });
                out.push(Instruction::Compare {
                    comparator: *comparator,
                });
            }

            Condition::Exists { metric } => {
                out.push(Instruction::ExistsCheck {
                    metric: metric.clone(),
                });
            }

            Condition::Literal(b) => {
                out.push(Instruction::PushConst {
                    value: Value::Bool(*b),
                });
            }

            Condition::Logical { operator, operands } => {
                let (first, rest) = operands.split_first().ok_or_else(|| {
                    CompileError::Structural(format!(
                        "{} group has no operands",
                        operator.keyword()
                    ))
                })?;

                Self::emit(first, out)?;
                for operand in rest {
                    Self::emit(operand, out)?;
                    out.push(match operator {
                        LogicalOperator::And => Instruction::And,
                        LogicalOperator::Or => Instruction::Or,
                    });
                }
            }
        }
        Ok(())
    }
}
