//! Compiled policy IR
//!
//! A `PolicyIr` is the long-lived, replayable form of a policy. Its `ir_hash`
//! is a SHA-256 digest of the canonical JSON serialization of every other
//! field, so the same AST always yields the same hash across runs, processes
//! and machines.

use crate::ast::{Action, ActionKind, Category, Mode};
use crate::error::Result;
use crate::ir::Instruction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Format tag mixed into every hash; bump when the IR layout changes
pub const IR_FORMAT: &str = "warden-ir/v1";

/// A compiled policy ready for evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyIr {
    /// Source policy ID
    pub policy_id: String,

    /// Hex SHA-256 content hash of the IR
    pub ir_hash: String,

    /// Header carried over from the policy
    pub metadata: IrMetadata,

    /// Compiled clauses, in evaluation order
    pub clauses: Vec<CompiledClause>,
}

/// Policy header as carried by the IR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrMetadata {
    pub version: String,
    pub mode: Mode,
    pub category: Category,
    #[serde(default)]
    pub scope: BTreeMap<String, String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A compiled clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledClause {
    /// Source clause ID
    pub clause_id: String,

    /// Declared clause dependencies
    #[serde(default)]
    pub after: Vec<String>,

    /// Ask the executor to stop when this clause matches
    #[serde(default)]
    pub halt_on_match: bool,

    /// Clause program (guards, postfix condition, halt)
    pub instructions: Vec<Instruction>,

    /// Actions associated with a match
    pub actions: Vec<ActionDescriptor>,
}

/// A resolved action: kind plus its message, never executable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Borrowed view of everything the hash covers
#[derive(Serialize)]
struct HashInput<'a> {
    format: &'static str,
    policy_id: &'a str,
    metadata: &'a IrMetadata,
    clauses: &'a [CompiledClause],
}

impl PolicyIr {
    /// Assemble an IR and compute its content hash
    pub fn new(
        policy_id: impl Into<String>,
        metadata: IrMetadata,
        clauses: Vec<CompiledClause>,
    ) -> Result<Self> {
        let policy_id = policy_id.into();
        let ir_hash = compute_hash(&policy_id, &metadata, &clauses)?;
        Ok(Self {
            policy_id,
            ir_hash,
            metadata,
            clauses,
        })
    }

    /// Build a new IR with the same header and different clauses
    pub fn with_clauses(&self, clauses: Vec<CompiledClause>) -> Result<Self> {
        Self::new(self.policy_id.clone(), self.metadata.clone(), clauses)
    }

    /// Recompute the hash and compare it with the stored one
    pub fn verify_hash(&self) -> Result<bool> {
        Ok(self.recompute_hash()? == self.ir_hash)
    }

    /// Hash of the current contents, regardless of the stored `ir_hash`
    pub fn recompute_hash(&self) -> Result<String> {
        compute_hash(&self.policy_id, &self.metadata, &self.clauses)
    }

    /// Canonical JSON serialization
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize IR from JSON (e.g. fetched from an external store)
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a clause by ID
    pub fn clause(&self, clause_id: &str) -> Option<&CompiledClause> {
        self.clauses.iter().find(|c| c.clause_id == clause_id)
    }

    /// Total number of instructions across clauses
    pub fn instruction_count(&self) -> usize {
        self.clauses.iter().map(|c| c.instructions.len()).sum()
    }
}

impl CompiledClause {
    /// Leading scope guards of the clause program
    pub fn guards(&self) -> &[Instruction] {
        let end = self
            .instructions
            .iter()
            .position(|i| !matches!(i, Instruction::PolicyCheck { .. }))
            .unwrap_or(self.instructions.len());
        &self.instructions[..end]
    }

    /// The postfix condition code, without guards and the trailing halt
    pub fn condition_code(&self) -> &[Instruction] {
        let start = self.guards().len();
        let end = match self.instructions.last() {
            Some(Instruction::HaltMatch) => self.instructions.len() - 1,
            _ => self.instructions.len(),
        };
        if start >= end {
            return &[];
        }
        &self.instructions[start..end]
    }

    /// Returns true if the clause carries an action of the given kind
    pub fn has_action(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|a| a.kind == kind)
    }
}

impl ActionDescriptor {
    pub fn new(kind: ActionKind, message: Option<String>) -> Self {
        Self { kind, message }
    }
}

impl From<&Action> for ActionDescriptor {
    fn from(action: &Action) -> Self {
        Self {
            kind: action.kind(),
            message: action.detail().map(str::to_string),
        }
    }
}

fn compute_hash(
    policy_id: &str,
    metadata: &IrMetadata,
    clauses: &[CompiledClause],
) -> Result<String> {
    let input = HashInput {
        format: IR_FORMAT,
        policy_id,
        metadata,
        clauses,
    };
    let bytes = serde_json::to_vec(&input)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
