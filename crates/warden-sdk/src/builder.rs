//! Builder pattern for PolicyEngine

use crate::config::EngineConfig;
use crate::engine::PolicyEngine;
use crate::error::Result;
use std::path::PathBuf;
use warden_compiler::CompilerOptions;

/// Builder for PolicyEngine
///
/// # Example
///
/// ```rust,ignore
/// use warden_sdk::PolicyEngineBuilder;
///
/// let engine = PolicyEngineBuilder::new()
///     .strict_metrics(false)
///     .known_metrics(["cost_usd", "tokens"])
///     .add_source(r#"policy budget { clause big: cost_usd > 100 -> WARN }"#)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct PolicyEngineBuilder {
    config: EngineConfig,
    sources: Vec<String>,
    source_files: Vec<PathBuf>,
}

impl PolicyEngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strict_metrics(mut self, strict: bool) -> Self {
        self.config.strict_metrics = strict;
        self
    }

    pub fn reject_warnings(mut self, reject: bool) -> Self {
        self.config.reject_warnings = reject;
        self
    }

    pub fn known_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_known_metrics(metrics);
        self
    }

    pub fn compiler_options(mut self, options: CompilerOptions) -> Self {
        self.config.compiler_options = options;
        self
    }

    /// Add policy source text; it may hold several policies
    pub fn add_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Add a policy file, read at build time
    pub fn add_source_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_files.push(path.into());
        self
    }

    /// Build the engine and install every added source
    pub fn build(self) -> Result<PolicyEngine> {
        let engine = PolicyEngine::new(self.config);

        for path in &self.source_files {
            let source = std::fs::read_to_string(path)?;
            let reports = engine.install_set(&source)?;
            tracing::debug!(path = %path.display(), policies = reports.len(), "policy file loaded");
        }
        for source in &self.sources {
            engine.install_set(source)?;
        }

        Ok(engine)
    }
}
