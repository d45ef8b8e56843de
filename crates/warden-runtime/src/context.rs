//! Fact snapshot
//!
//! The only input an evaluation reads besides the IR. A snapshot is supplied
//! wholesale by the caller and is never modified by the runtime.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use warden_core::Value;

/// Immutable metric name to value mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSnapshot {
    facts: BTreeMap<String, Value>,
}

impl FactSnapshot {
    pub fn new(facts: BTreeMap<String, Value>) -> Self {
        Self { facts }
    }

    /// Parse a snapshot from a flat JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style insert, for assembling a snapshot before evaluation
    pub fn with(mut self, metric: impl Into<String>, value: impl Into<Value>) -> Self {
        self.facts.insert(metric.into(), value.into());
        self
    }

    /// Value of a metric; `null` counts as absent
    pub fn get(&self, metric: &str) -> Option<&Value> {
        self.facts.get(metric).filter(|value| !value.is_null())
    }

    pub fn contains(&self, metric: &str) -> bool {
        self.get(metric).is_some()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.facts.iter()
    }
}

impl From<BTreeMap<String, Value>> for FactSnapshot {
    fn from(facts: BTreeMap<String, Value>) -> Self {
        Self::new(facts)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FactSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            facts: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
