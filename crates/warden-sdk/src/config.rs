//! Configuration types for PolicyEngine

use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use warden_compiler::{CompilerOptions, ValidationContext};

/// Main engine configuration
///
/// ```yaml
/// strict_metrics: false
/// reject_warnings: true
/// known_metrics: [cost_usd, tokens]
/// compiler_options:
///   passes:
///     dead_clause_elimination: false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fail evaluation on a missing metric instead of leaving the clause unmatched
    pub strict_metrics: bool,

    /// Compiler options
    pub compiler_options: CompilerOptions,

    /// Refuse to install policies that compile with warnings
    pub reject_warnings: bool,

    /// Metric mapping; overrides `compiler_options.validation` when set
    pub known_metrics: Option<Vec<String>>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            strict_metrics: true,
            compiler_options: CompilerOptions::default(),
            reject_warnings: false,
            known_metrics: None,
        }
    }

    /// Parse a configuration from YAML; missing fields take their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| SdkError::Config(format!("Invalid engine configuration: {}", e)))
    }

    /// Load a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn with_strict_metrics(mut self, strict: bool) -> Self {
        self.strict_metrics = strict;
        self
    }

    pub fn with_compiler_options(mut self, options: CompilerOptions) -> Self {
        self.compiler_options = options;
        self
    }

    pub fn with_reject_warnings(mut self, reject: bool) -> Self {
        self.reject_warnings = reject;
        self
    }

    pub fn with_known_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_metrics = Some(metrics.into_iter().map(Into::into).collect());
        self
    }

    /// Compiler options with the metric mapping applied
    pub fn effective_compiler_options(&self) -> CompilerOptions {
        let mut options = self.compiler_options.clone();
        if let Some(metrics) = &self.known_metrics {
            options.validation = ValidationContext::with_known_metrics(metrics.iter().cloned());
        }
        options
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.strict_metrics);
        assert!(!config.reject_warnings);
        assert!(config.compiler_options.enable_validation);
        assert!(config.known_metrics.is_none());
    }

    #[test]
    fn test_from_yaml() {
        let config = EngineConfig::from_yaml(
            r#"
strict_metrics: false
reject_warnings: true
known_metrics: [cost_usd, tokens]
compiler_options:
  passes:
    dead_clause_elimination: false
"#,
        )
        .unwrap();

        assert!(!config.strict_metrics);
        assert!(config.reject_warnings);
        assert!(!config.compiler_options.passes.dead_clause_elimination);
        assert!(config.compiler_options.passes.constant_folding);

        let options = config.effective_compiler_options();
        let known = options.validation.known_metrics.unwrap();
        assert!(known.contains("cost_usd"));
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(EngineConfig::from_yaml("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = EngineConfig::from_yaml("strict_metrics: [1, 2]").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::new()
            .with_strict_metrics(false)
            .with_reject_warnings(true)
            .with_known_metrics(["latency_ms"]);
        assert!(!config.strict_metrics);
        assert!(config.reject_warnings);
        assert_eq!(config.known_metrics, Some(vec!["latency_ms".to_string()]));
    }
}
