//! Policy compiler
//!
//! Compiles a `PolicyAst` into `PolicyIr`. Each clause program is laid out as
//!
//! ```text
//! PolicyCheck*      one scope guard per scope entry, in key order
//! <condition>       postfix code leaving one boolean
//! HaltMatch         pops the verdict and ends the program
//! ```

use super::condition_codegen::ConditionCompiler;
use crate::error::Result;
use warden_core::ast::{Clause, PolicyAst};
use warden_core::ir::{ActionDescriptor, CompiledClause, Instruction, IrMetadata, PolicyIr};

/// Policy compiler
pub struct PolicyCompiler;

impl PolicyCompiler {
    /// Compile a policy into hashed IR, keeping clause declaration order
    pub fn compile(policy: &PolicyAst) -> Result<PolicyIr> {
        let meta = &policy.metadata;
        let guards: Vec<Instruction> = meta
            .scope
            .iter()
            .map(|(key, expected)| Instruction::PolicyCheck {
                key: key.clone(),
                expected: expected.clone(),
            })
            .collect();

        let clauses = policy
            .clauses
            .iter()
            .map(|clause| Self::compile_clause(clause, &guards))
            .collect::<Result<Vec<_>>>()?;

        let metadata = IrMetadata {
            version: meta.version.clone(),
            mode: meta.mode,
            category: meta.category,
            scope: meta.scope.clone(),
            depends_on: meta.depends_on.clone(),
        };

        let ir = PolicyIr::new(meta.id.clone(), metadata, clauses)?;
        log::debug!(
            "compiled policy '{}' into {} instruction(s), hash {}",
            ir.policy_id,
            ir.instruction_count(),
            ir.ir_hash
        );
        Ok(ir)
    }

    fn compile_clause(clause: &Clause, guards: &[Instruction]) -> Result<CompiledClause> {
        let mut instructions = guards.to_vec();
        instructions.extend(ConditionCompiler::compile(&clause.condition)?);
        instructions.push(Instruction::HaltMatch);

        Ok(CompiledClause {
            clause_id: clause.id.clone(),
            after: clause.after.clone(),
            halt_on_match: clause.halt,
            instructions,
            actions: clause.actions.iter().map(ActionDescriptor::from).collect(),
        })
    }
}
