//! Execution DAG
//!
//! Nodes (policies or clauses) with declared dependencies and a priority
//! rank. Building the DAG computes a total, deterministic evaluation order:
//! dependencies first, then lower priority rank, then lexicographic id.

use crate::error::DagError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A node of the execution DAG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionNode {
    pub id: String,
    pub depends_on: BTreeSet<String>,
    /// Lower ranks are evaluated first among ready nodes
    pub priority: u8,
}

/// A validated, acyclic execution graph with its total order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDag {
    nodes: BTreeMap<String, ExecutionNode>,
    order: Vec<String>,
}

impl ExecutionNode {
    pub fn new(id: impl Into<String>, priority: u8) -> Self {
        Self {
            id: id.into(),
            depends_on: BTreeSet::new(),
            priority,
        }
    }

    /// Add a dependency
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.depends_on.insert(id.into());
        self
    }
}

impl ExecutionDag {
    /// Build the DAG, rejecting duplicates, unknown dependencies and cycles
    pub fn build(nodes: Vec<ExecutionNode>) -> Result<Self, DagError> {
        let mut by_id = BTreeMap::new();
        for node in nodes {
            if by_id.contains_key(&node.id) {
                return Err(DagError::DuplicateNode(node.id));
            }
            by_id.insert(node.id.clone(), node);
        }

        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for node in by_id.values() {
            in_degree.insert(node.id.as_str(), node.depends_on.len());
            for dependency in &node.depends_on {
                if !by_id.contains_key(dependency) {
                    return Err(DagError::UnknownDependency {
                        node: node.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
                dependents
                    .entry(dependency.as_str())
                    .or_default()
                    .push(node.id.as_str());
            }
        }

        // Kahn's algorithm; the ready set is ordered by (priority, id)
        let mut ready: BTreeSet<(u8, &str)> = by_id
            .values()
            .filter(|n| n.depends_on.is_empty())
            .map(|n| (n.priority, n.id.as_str()))
            .collect();
        let mut order = Vec::with_capacity(by_id.len());

        while let Some(next) = ready.pop_first() {
            let (_, id) = next;
            order.push(id.to_string());
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert((by_id[*dependent].priority, *dependent));
                    }
                }
            }
        }

        if order.len() < by_id.len() {
            let placed: BTreeSet<&str> = order.iter().map(String::as_str).collect();
            let remaining: BTreeSet<&str> = by_id
                .keys()
                .map(String::as_str)
                .filter(|id| !placed.contains(id))
                .collect();
            let participants = cycle_participants(&by_id, remaining);
            return Err(DagError::Cycle { participants });
        }

        log::debug!("execution order: {}", order.join(" -> "));

        Ok(Self {
            nodes: by_id,
            order,
        })
    }

    /// Node ids in evaluation order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn node(&self, id: &str) -> Option<&ExecutionNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Strip nodes that are merely downstream of a cycle
fn cycle_participants(
    nodes: &BTreeMap<String, ExecutionNode>,
    mut remaining: BTreeSet<&str>,
) -> Vec<String> {
    loop {
        let downstream_only: Vec<&str> = remaining
            .iter()
            .copied()
            .filter(|id| {
                !remaining
                    .iter()
                    .any(|other| nodes[*other].depends_on.contains(*id))
            })
            .collect();
        if downstream_only.is_empty() {
            break;
        }
        for id in downstream_only {
            remaining.remove(id);
        }
    }
    remaining.into_iter().map(str::to_string).collect()
}
