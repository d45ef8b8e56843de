//! Constant folding optimizer
//!
//! Collapses instruction windows that operate purely on constants into a
//! single `PushConst`:
//!
//! ```text
//! PushConst a, PushConst b, Compare op   =>  PushConst (a op b)
//! PushConst x, PushConst y, And | Or     =>  PushConst (x and/or y)
//! ```
//!
//! Folding repeats until nothing changes. Only the condition code between the
//! scope guards and the trailing `HaltMatch` is rewritten, so a window never
//! spans a fact read or a guard. Windows whose operand kinds do not fit are
//! left for the interpreter to reject.

use super::{DiagnosticKind, OptimizationPass, OptimizerDiagnostic, PassOutput};
use crate::error::Result;
use warden_core::ir::{CompiledClause, Instruction, PolicyIr};
use warden_core::Value;

const PASS: &str = "constant_folding";

/// Constant folding optimizer
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantFolder;

impl ConstantFolder {
    pub fn new() -> Self {
        Self
    }

    /// Fold a postfix code sequence to a fixed point, returning the folded
    /// code and the number of windows collapsed
    pub fn fold(&self, code: &[Instruction]) -> (Vec<Instruction>, usize) {
        let mut current = code.to_vec();
        let mut folds = 0;

        loop {
            let mut next = Vec::with_capacity(current.len());
            let mut i = 0;
            let mut changed = false;
            while i < current.len() {
                if i + 2 < current.len() {
                    if let Some(value) = fold_window(&current[i], &current[i + 1], &current[i + 2])
                    {
                        next.push(Instruction::PushConst { value });
                        i += 3;
                        folds += 1;
                        changed = true;
                        continue;
                    }
                }
                next.push(current[i].clone());
                i += 1;
            }
            current = next;
            if !changed {
                return (current, folds);
            }
        }
    }

    fn fold_clause(&self, clause: &CompiledClause) -> (CompiledClause, usize) {
        let (code, folds) = self.fold(clause.condition_code());
        if folds == 0 {
            return (clause.clone(), 0);
        }

        let mut instructions = clause.guards().to_vec();
        instructions.extend(code);
        if clause.instructions.last() == Some(&Instruction::HaltMatch) {
            instructions.push(Instruction::HaltMatch);
        }
        let folded = CompiledClause {
            instructions,
            ..clause.clone()
        };
        (folded, folds)
    }
}

impl OptimizationPass for ConstantFolder {
    fn name(&self) -> &'static str {
        PASS
    }

    fn run(&self, ir: &PolicyIr) -> Result<PassOutput> {
        let mut diagnostics = Vec::new();
        let mut clauses = Vec::with_capacity(ir.clauses.len());

        for clause in &ir.clauses {
            let (folded, folds) = self.fold_clause(clause);
            if folds > 0 {
                diagnostics.push(OptimizerDiagnostic::new(
                    PASS,
                    Some(&clause.clause_id),
                    DiagnosticKind::Folded,
                    format!("folded {} constant window(s)", folds),
                ));
            }
            clauses.push(folded);
        }

        if diagnostics.is_empty() {
            return Ok((ir.clone(), diagnostics));
        }
        Ok((ir.with_clauses(clauses)?, diagnostics))
    }
}

fn fold_window(a: &Instruction, b: &Instruction, op: &Instruction) -> Option<Value> {
    let (Instruction::PushConst { value: left }, Instruction::PushConst { value: right }) = (a, b)
    else {
        return None;
    };

    match op {
        Instruction::Compare { comparator } => comparator.apply(left, right).map(Value::Bool),
        Instruction::And => Some(Value::Bool(left.as_bool()? && right.as_bool()?)),
        Instruction::Or => Some(Value::Bool(left.as_bool()? || right.as_bool()?)),
        _ => None,
    }
}
