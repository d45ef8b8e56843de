//! Clause program interpreter
//!
//! Executes compiled clause programs on an explicit operand stack with an
//! instruction pointer. Evaluation is pure: the only inputs are the IR and
//! the fact snapshot, and the same pair always yields the same result.

use crate::context::FactSnapshot;
use crate::error::{Result, RuntimeError};
use crate::result::{ActionResult, ClauseResult, ClauseTrace, EvaluationResult};
use warden_core::ast::Comparator;
use warden_core::ir::{CompiledClause, Instruction, PolicyIr};
use warden_core::{Value, ValueKind};

const CONSTANT: &str = "<constant>";

/// A stack entry and the metric it was read from
#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    metric: Option<String>,
}

impl Slot {
    fn constant(value: Value) -> Self {
        Self {
            value,
            metric: None,
        }
    }

    fn label(&self) -> &str {
        self.metric.as_deref().unwrap_or(CONSTANT)
    }
}

enum Flow {
    Next,
    Done(bool),
}

/// Stack machine over `PolicyIr`
#[derive(Debug, Clone, Copy)]
pub struct Interpreter {
    strict: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Strict interpreter: a missing metric is an error
    pub fn new() -> Self {
        Self { strict: true }
    }

    /// Lenient interpreter: a missing metric leaves the clause unmatched
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Evaluate every clause of a policy, in IR order
    pub fn evaluate(&self, ir: &PolicyIr, facts: &FactSnapshot) -> Result<EvaluationResult> {
        let mut clause_results = Vec::with_capacity(ir.clauses.len());
        let mut action_results = Vec::new();
        let mut halt_requested = false;

        for clause in &ir.clauses {
            let result = self.run_clause(clause, facts)?;
            tracing::debug!(
                policy_id = %ir.policy_id,
                clause_id = %clause.clause_id,
                matched = result.matched,
                steps = result.trace.steps.len(),
                "clause evaluated"
            );

            if result.matched {
                action_results.extend(clause.actions.iter().map(|action| ActionResult {
                    clause_id: clause.clause_id.clone(),
                    action: action.clone(),
                }));
                halt_requested |= clause.halt_on_match;
            }
            clause_results.push(result);
        }

        Ok(EvaluationResult {
            policy_id: ir.policy_id.clone(),
            ir_hash: ir.ir_hash.clone(),
            mode: ir.metadata.mode,
            clause_results,
            action_results,
            halt_requested,
        })
    }

    /// Evaluate IR loaded from storage, refusing IR whose hash does not match
    pub fn replay(&self, ir: &PolicyIr, facts: &FactSnapshot) -> Result<EvaluationResult> {
        let actual = ir.recompute_hash()?;
        if actual != ir.ir_hash {
            tracing::warn!(policy_id = %ir.policy_id, "refusing to replay altered IR");
            return Err(RuntimeError::IntegrityMismatch {
                policy_id: ir.policy_id.clone(),
                expected: ir.ir_hash.clone(),
                actual,
            });
        }
        self.evaluate(ir, facts)
    }

    fn run_clause(&self, clause: &CompiledClause, facts: &FactSnapshot) -> Result<ClauseResult> {
        let mut stack: Vec<Slot> = Vec::new();
        let mut trace = ClauseTrace::default();
        let mut ip = 0;

        let matched = loop {
            let Some(instruction) = clause.instructions.get(ip) else {
                return Err(RuntimeError::MalformedProgram {
                    clause_id: clause.clause_id.clone(),
                    reason: "program ends without halt_match".to_string(),
                });
            };

            let flow = self.step(clause, ip, instruction, &mut stack, facts, &mut trace)?;
            trace.step(ip, instruction.mnemonic(), stack.len());
            match flow {
                Flow::Next => ip += 1,
                Flow::Done(matched) => break matched,
            }
        };

        Ok(ClauseResult {
            clause_id: clause.clause_id.clone(),
            matched,
            trace,
        })
    }

    fn step(
        &self,
        clause: &CompiledClause,
        ip: usize,
        instruction: &Instruction,
        stack: &mut Vec<Slot>,
        facts: &FactSnapshot,
        trace: &mut ClauseTrace,
    ) -> Result<Flow> {
        let pop = |stack: &mut Vec<Slot>| {
            stack.pop().ok_or_else(|| RuntimeError::StackUnderflow {
                clause_id: clause.clause_id.clone(),
                ip,
            })
        };

        match instruction {
            Instruction::PushConst { value } => {
                stack.push(Slot::constant(value.clone()));
            }

            Instruction::PushFact { metric } => match facts.get(metric) {
                Some(value) => stack.push(Slot {
                    value: value.clone(),
                    metric: Some(metric.clone()),
                }),
                None if self.strict => {
                    return Err(RuntimeError::MissingMetric {
                        metric: metric.clone(),
                    })
                }
                None => {
                    tracing::warn!(
                        clause_id = %clause.clause_id,
                        metric = %metric,
                        "metric missing, clause left unmatched"
                    );
                    trace.diagnostics.push(format!(
                        "metric '{}' is missing; clause left unmatched",
                        metric
                    ));
                    stack.clear();
                    return Ok(Flow::Done(false));
                }
            },

            Instruction::Compare { comparator } => {
                let right = pop(stack)?;
                let left = pop(stack)?;
                let result = compare(*comparator, &left, &right)?;
                stack.push(Slot::constant(Value::Bool(result)));
            }

            Instruction::And | Instruction::Or => {
                let right = pop(stack)?;
                let left = pop(stack)?;
                let (l, r) = (expect_bool(&left)?, expect_bool(&right)?);
                let result = if *instruction == Instruction::And {
                    l && r
                } else {
                    l || r
                };
                stack.push(Slot::constant(Value::Bool(result)));
            }

            Instruction::ExistsCheck { metric } => {
                stack.push(Slot::constant(Value::Bool(facts.contains(metric))));
            }

            Instruction::PolicyCheck { key, expected } => {
                let in_scope = facts.get(key).and_then(Value::as_str) == Some(expected.as_str());
                if !in_scope {
                    stack.clear();
                    return Ok(Flow::Done(false));
                }
            }

            Instruction::HaltMatch => {
                let verdict = pop(stack)?;
                if !stack.is_empty() {
                    return Err(RuntimeError::MalformedProgram {
                        clause_id: clause.clause_id.clone(),
                        reason: format!("{} value(s) left on the stack", stack.len()),
                    });
                }
                let Some(matched) = verdict.value.as_bool() else {
                    return Err(RuntimeError::MalformedProgram {
                        clause_id: clause.clause_id.clone(),
                        reason: format!("verdict is a {}, expected bool", verdict.value.kind()),
                    });
                };
                return Ok(Flow::Done(matched));
            }
        }

        Ok(Flow::Next)
    }
}

/// Evaluate a policy with a strict interpreter
pub fn evaluate(ir: &PolicyIr, facts: &FactSnapshot) -> Result<EvaluationResult> {
    Interpreter::new().evaluate(ir, facts)
}

fn compare(comparator: Comparator, left: &Slot, right: &Slot) -> Result<bool> {
    if let Some(result) = comparator.apply(&left.value, &right.value) {
        return Ok(result);
    }

    // Report against the fact side where there is one
    let (subject, other) = if left.metric.is_some() || right.metric.is_none() {
        (left, right)
    } else {
        (right, left)
    };
    let (offender, expected_kind) = if comparator.is_ordering() {
        if subject.value.kind() != ValueKind::Number {
            (subject, ValueKind::Number)
        } else {
            (other, ValueKind::Number)
        }
    } else {
        (subject, other.value.kind())
    };

    Err(RuntimeError::TypeMismatch {
        metric: offender.label().to_string(),
        expected_kind,
        actual_kind: offender.value.kind(),
    })
}

fn expect_bool(slot: &Slot) -> Result<bool> {
    slot.value.as_bool().ok_or_else(|| RuntimeError::TypeMismatch {
        metric: slot.label().to_string(),
        expected_kind: ValueKind::Bool,
        actual_kind: slot.value.kind(),
    })
}
