//! Main compiler
//!
//! Provides a unified interface for the front half of the pipeline:
//! source text or AST in, validated and optimized `PolicyIr` out.

use crate::codegen::PolicyCompiler;
use crate::error::{CompileError, Result};
use crate::optimizer::{self, OptimizerDiagnostic, PassSet};
use crate::validator::{ValidationContext, ValidationIssue, Validator};
use serde::{Deserialize, Serialize};
use warden_core::ast::PolicyAst;
use warden_core::ir::PolicyIr;
use warden_parser::{parse_policy, parse_policy_set};

/// Compiler options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Run the validator before code generation
    pub enable_validation: bool,
    /// Optimizer passes to run after code generation
    pub passes: PassSet,
    /// Metric mapping and other validation inputs
    pub validation: ValidationContext,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            enable_validation: true,
            passes: PassSet::all(),
            validation: ValidationContext::default(),
        }
    }
}

/// A compiled policy together with everything the compiler reported
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub ir: PolicyIr,
    /// Warning-severity validation issues
    pub warnings: Vec<ValidationIssue>,
    /// Optimizer reports, in pass order
    pub diagnostics: Vec<OptimizerDiagnostic>,
}

/// The Warden compiler
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
    validator: Validator,
}

impl Compiler {
    /// Create a compiler with default options
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            validator: Validator::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile an AST into IR
    pub fn compile_policy(&self, policy: &PolicyAst) -> Result<PolicyIr> {
        Ok(self.compile(policy)?.ir)
    }

    /// Compile an AST, keeping warnings and optimizer diagnostics
    pub fn compile(&self, policy: &PolicyAst) -> Result<Compilation> {
        let mut warnings = Vec::new();
        if self.options.enable_validation {
            let result = self.validator.validate(policy, &self.options.validation);
            if result.has_errors() {
                return Err(CompileError::Validation {
                    issues: result.errors().cloned().collect(),
                });
            }
            warnings = result.issues;
        }

        let ir = PolicyCompiler::compile(policy)?;
        let (ir, diagnostics) = optimizer::optimize(&ir, &self.options.passes)?;

        log::debug!(
            "policy '{}' compiled: {} clause(s), {} warning(s), {} optimizer diagnostic(s)",
            ir.policy_id,
            ir.clauses.len(),
            warnings.len(),
            diagnostics.len()
        );
        Ok(Compilation {
            ir,
            warnings,
            diagnostics,
        })
    }

    /// Lex, parse and compile a single policy
    pub fn compile_source(&self, source: &str) -> Result<PolicyIr> {
        let ast = parse_policy(source)?;
        self.compile_policy(&ast)
    }

    /// Lex, parse and compile every policy of a source, in declaration order
    pub fn compile_source_set(&self, source: &str) -> Result<Vec<PolicyIr>> {
        parse_policy_set(source)?
            .iter()
            .map(|ast| self.compile_policy(ast))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::ast::Mode;
    use warden_core::ir::Instruction;

    #[test]
    fn test_compile_source_end_to_end() {
        let ir = Compiler::new()
            .compile_source("policy p1 { mode: ENFORCE; clause c1: cost_usd > 100 -> BLOCK }")
            .unwrap();
        assert_eq!(ir.policy_id, "p1");
        assert_eq!(ir.metadata.mode, Mode::Enforce);
        assert_eq!(ir.clauses.len(), 1);
        assert_eq!(ir.clauses[0].instructions.len(), 4);
        assert_eq!(ir.clauses[0].instructions[3], Instruction::HaltMatch);
    }

    #[test]
    fn test_validation_errors_block_compilation() {
        let err = Compiler::new()
            .compile_source(r#"policy p { clause c: region > "eu" -> BLOCK }"#)
            .unwrap_err();
        match err {
            CompileError::Validation { issues } => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].rule_id, "V003");
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let compiler = Compiler::with_options(CompilerOptions {
            enable_validation: false,
            ..CompilerOptions::default()
        });
        assert!(compiler
            .compile_source(r#"policy p { clause c: region > "eu" -> BLOCK }"#)
            .is_ok());
    }

    #[test]
    fn test_warnings_are_reported() {
        let compilation = Compiler::new()
            .compile(&parse_policy("policy p { clause c: cost > 1 -> BLOCK }").unwrap())
            .unwrap();
        assert!(compilation.warnings.iter().any(|w| w.rule_id == "W002"));
    }

    #[test]
    fn test_parse_errors_surface() {
        let err = Compiler::new().compile_source("policy { }").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn test_compile_source_set() {
        let irs = Compiler::new()
            .compile_source_set("policy a { } policy b { clause c: x > 1 -> WARN }")
            .unwrap();
        assert_eq!(irs.len(), 2);
        assert_eq!(irs[1].clauses.len(), 1);
    }

    #[test]
    fn test_options_from_json() {
        let options: CompilerOptions = serde_json::from_str(
            r#"{"passes": {"constant_folding": false}, "validation": {"known_metrics": ["cost_usd"]}}"#,
        )
        .unwrap();
        assert!(options.enable_validation);
        assert!(!options.passes.constant_folding);
        assert!(options.passes.clause_ordering);
        assert_eq!(options.validation.known_metrics.map(|m| m.len()), Some(1));
    }
}
