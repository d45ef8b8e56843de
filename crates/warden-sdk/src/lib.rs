//! Warden SDK
//!
//! High-level API over the policy toolchain: install policies from source or
//! stored IR, evaluate them against fact snapshots, and replay past decisions.

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;

// Re-export main types
pub use builder::PolicyEngineBuilder;
pub use config::EngineConfig;
pub use engine::{Decision, InstallReport, PolicyEngine};
pub use error::{Result, SdkError};

// Re-export commonly used types from dependencies
pub use warden_compiler::{CompilerOptions, PassSet, PolicyConflict};
pub use warden_core::{ir::PolicyIr, Value};
pub use warden_runtime::{
    EvaluationResult, ExecutionTrace, FactSnapshot, Intent, IntentType,
};
