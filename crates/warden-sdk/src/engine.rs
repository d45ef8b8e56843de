//! Policy engine
//!
//! Ties the toolchain together: source text goes in, content-addressed IR is
//! stored, and evaluations run against whatever has been installed.
//!
//! Every compiled `PolicyIr` is kept under its `ir_hash`, so older versions
//! stay available for replay. For each policy id the most recently installed
//! version is the current one; `evaluate_all` and `conflicts` work on
//! current versions only.

use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use warden_compiler::optimizer::dag_sort::policy_dag;
use warden_compiler::{
    CompileError, Compiler, ConflictDetector, OptimizerDiagnostic, PolicyConflict,
    ValidationIssue,
};
use warden_core::ast::PolicyAst;
use warden_core::ir::PolicyIr;
use warden_parser::{parse_policy, parse_policy_set};
use warden_runtime::{
    DagExecutor, EvaluationResult, ExecutionTrace, FactSnapshot, Intent, IntentEmitter,
    Interpreter, RuntimeError,
};

/// Outcome of installing one policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallReport {
    pub policy_id: String,
    pub ir_hash: String,
    /// Served from the source cache without recompiling
    pub cached: bool,
    pub warnings: Vec<ValidationIssue>,
    pub diagnostics: Vec<OptimizerDiagnostic>,
}

/// An evaluation together with the intents it produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub evaluation: EvaluationResult,
    pub intents: Vec<Intent>,
}

#[derive(Debug, Default)]
struct Registry {
    /// Every installed IR, by hash
    by_hash: HashMap<String, Arc<PolicyIr>>,
    /// Current hash per policy id
    current: BTreeMap<String, String>,
    /// Source digest to the reports of the policies it produced
    sources: HashMap<String, Vec<InstallReport>>,
}

impl Registry {
    fn insert(&mut self, ir: Arc<PolicyIr>) {
        self.current
            .insert(ir.policy_id.clone(), ir.ir_hash.clone());
        self.by_hash.insert(ir.ir_hash.clone(), ir);
    }

    fn current_policies(&self) -> Vec<Arc<PolicyIr>> {
        self.current
            .values()
            .filter_map(|hash| self.by_hash.get(hash).cloned())
            .collect()
    }
}

/// Thread-safe policy engine
#[derive(Debug)]
pub struct PolicyEngine {
    config: EngineConfig,
    compiler: Compiler,
    interpreter: Interpreter,
    emitter: IntentEmitter,
    registry: RwLock<Registry>,
}

impl PolicyEngine {
    pub fn new(config: EngineConfig) -> Self {
        let compiler = Compiler::with_options(config.effective_compiler_options());
        let interpreter = Interpreter::with_strict(config.strict_metrics);
        Self {
            config,
            compiler,
            interpreter,
            emitter: IntentEmitter::new(),
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ===== Installation =====

    /// Compile and install a single policy
    pub fn install_source(&self, source: &str) -> Result<InstallReport> {
        let mut reports = self.install_text(source, SourceKind::Single)?;
        reports
            .pop()
            .ok_or_else(|| SdkError::Config("source produced no policy".to_string()))
    }

    /// Compile and install every policy of a source
    ///
    /// Nothing is installed unless every policy compiles.
    pub fn install_set(&self, source: &str) -> Result<Vec<InstallReport>> {
        self.install_text(source, SourceKind::Set)
    }

    /// Install IR fetched from an external store; the hash is verified first
    pub fn install_ir(&self, ir: PolicyIr) -> Result<InstallReport> {
        let actual = ir.recompute_hash()?;
        if actual != ir.ir_hash {
            return Err(RuntimeError::IntegrityMismatch {
                policy_id: ir.policy_id,
                expected: ir.ir_hash,
                actual,
            }
            .into());
        }

        let report = InstallReport {
            policy_id: ir.policy_id.clone(),
            ir_hash: ir.ir_hash.clone(),
            cached: false,
            warnings: Vec::new(),
            diagnostics: Vec::new(),
        };
        tracing::info!(policy_id = %report.policy_id, ir_hash = %report.ir_hash, "IR installed");
        self.write().insert(Arc::new(ir));
        Ok(report)
    }

    fn install_text(&self, source: &str, kind: SourceKind) -> Result<Vec<InstallReport>> {
        let digest = source_digest(source, kind);

        {
            let mut registry = self.write();
            if let Some(reports) = registry.sources.get(&digest).cloned() {
                let mut hits = Vec::with_capacity(reports.len());
                for report in reports {
                    if let Some(ir) = registry.by_hash.get(&report.ir_hash).cloned() {
                        registry.insert(ir);
                    }
                    tracing::debug!(policy_id = %report.policy_id, "source cache hit");
                    hits.push(InstallReport {
                        cached: true,
                        ..report
                    });
                }
                return Ok(hits);
            }
        }

        let asts: Vec<PolicyAst> = match kind {
            SourceKind::Single => vec![parse_policy(source)?],
            SourceKind::Set => parse_policy_set(source)?,
        };

        let mut compiled = Vec::with_capacity(asts.len());
        for ast in &asts {
            let compilation = self.compiler.compile(ast)?;
            if self.config.reject_warnings && !compilation.warnings.is_empty() {
                return Err(CompileError::Validation {
                    issues: compilation.warnings,
                }
                .into());
            }
            compiled.push(compilation);
        }

        let mut registry = self.write();
        let mut reports = Vec::with_capacity(compiled.len());
        for compilation in compiled {
            let report = InstallReport {
                policy_id: compilation.ir.policy_id.clone(),
                ir_hash: compilation.ir.ir_hash.clone(),
                cached: false,
                warnings: compilation.warnings,
                diagnostics: compilation.diagnostics,
            };
            tracing::info!(
                policy_id = %report.policy_id,
                ir_hash = %report.ir_hash,
                warnings = report.warnings.len(),
                "policy installed"
            );
            registry.insert(Arc::new(compilation.ir));
            reports.push(report);
        }
        registry.sources.insert(digest, reports.clone());
        Ok(reports)
    }

    // ===== Lookup =====

    /// Installed IR by hash
    pub fn policy(&self, ir_hash: &str) -> Option<Arc<PolicyIr>> {
        self.read().by_hash.get(ir_hash).cloned()
    }

    /// Current version of every installed policy, ordered by policy id
    pub fn policies(&self) -> Vec<Arc<PolicyIr>> {
        self.read().current_policies()
    }

    /// Hash of the current version of a policy
    pub fn current_hash(&self, policy_id: &str) -> Option<String> {
        self.read().current.get(policy_id).cloned()
    }

    // ===== Evaluation =====

    pub fn evaluate(&self, ir_hash: &str, facts: &FactSnapshot) -> Result<EvaluationResult> {
        let ir = self
            .policy(ir_hash)
            .ok_or_else(|| SdkError::UnknownPolicy(ir_hash.to_string()))?;
        Ok(self.interpreter.evaluate(&ir, facts)?)
    }

    /// Evaluate and emit intents
    pub fn decide(&self, ir_hash: &str, facts: &FactSnapshot) -> Result<Decision> {
        let evaluation = self.evaluate(ir_hash, facts)?;
        let intents = self.emitter.emit(&evaluation);
        Ok(Decision {
            evaluation,
            intents,
        })
    }

    /// Run every current policy in dependency order
    pub fn evaluate_all(&self, facts: &FactSnapshot) -> Result<ExecutionTrace> {
        let policies: Vec<PolicyIr> = self
            .policies()
            .iter()
            .map(|ir| PolicyIr::clone(ir))
            .collect();
        let dag = policy_dag(&policies)?;
        let programs: BTreeMap<String, PolicyIr> = policies
            .into_iter()
            .map(|ir| (ir.policy_id.clone(), ir))
            .collect();

        Ok(DagExecutor::new(self.interpreter).execute(&dag, &programs, facts)?)
    }

    /// Intents of a whole execution trace
    pub fn intents(&self, trace: &ExecutionTrace) -> Vec<Intent> {
        self.emitter.emit_trace(trace)
    }

    /// Contradicting clause pairs across current policies
    pub fn conflicts(&self) -> Vec<PolicyConflict> {
        let policies: Vec<PolicyIr> = self
            .policies()
            .iter()
            .map(|ir| PolicyIr::clone(ir))
            .collect();
        let conflicts = ConflictDetector::new().detect(&policies);
        for conflict in &conflicts {
            tracing::warn!(
                conflict_type = %conflict.conflict_type,
                "{}",
                conflict.explanation
            );
        }
        conflicts
    }

    /// Replay stored IR; needs nothing from the registry
    pub fn replay(&self, ir: &PolicyIr, facts: &FactSnapshot) -> Result<EvaluationResult> {
        Ok(self.interpreter.replay(ir, facts)?)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum SourceKind {
    Single,
    Set,
}

fn source_digest(source: &str, kind: SourceKind) -> String {
    let tag: &[u8] = match kind {
        SourceKind::Single => b"policy\0",
        SourceKind::Set => b"set\0",
    };
    let mut hasher = Sha256::new();
    hasher.update(tag);
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
