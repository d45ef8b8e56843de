//! Policy AST definitions

use super::clause::Clause;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A parsed policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAst {
    /// Policy header
    pub metadata: PolicyMetadata,

    /// Clauses in declaration order
    pub clauses: Vec<Clause>,
}

/// Policy header fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    /// Unique policy ID
    pub id: String,

    /// Author-supplied version string
    pub version: String,

    /// Enforcement mode
    pub mode: Mode,

    /// Category, drives evaluation priority
    pub category: Category,

    /// Scope the policy applies to (e.g. `resource = "payments"`)
    #[serde(default)]
    pub scope: BTreeMap<String, String>,

    /// Policies that must be evaluated before this one
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Enforcement mode of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Observe only; matched actions are advisory
    #[default]
    Monitor,
    /// Matched actions are meant to be enforced
    Enforce,
}

/// Policy category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Safety,
    Privacy,
    Operational,
    Routing,
    #[default]
    Custom,
}

impl PolicyAst {
    pub fn new(metadata: PolicyMetadata, clauses: Vec<Clause>) -> Self {
        Self { metadata, clauses }
    }

    /// Look up a clause by ID
    pub fn clause(&self, id: &str) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.id == id)
    }
}

impl PolicyMetadata {
    /// Create metadata with default version, mode and category
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: "1".to_string(),
            mode: Mode::default(),
            category: Category::default(),
            scope: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Add a scope entry
    pub fn with_scope(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope.insert(key.into(), value.into());
        self
    }

    pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = depends_on;
        self
    }
}

impl Mode {
    pub fn keyword(&self) -> &'static str {
        match self {
            Mode::Monitor => "MONITOR",
            Mode::Enforce => "ENFORCE",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "MONITOR" => Some(Mode::Monitor),
            "ENFORCE" => Some(Mode::Enforce),
            _ => None,
        }
    }
}

impl Category {
    /// Every category, highest priority first
    pub const ALL: [Category; 5] = [
        Category::Safety,
        Category::Privacy,
        Category::Operational,
        Category::Routing,
        Category::Custom,
    ];

    /// Evaluation rank; lower runs first
    pub fn priority(&self) -> u8 {
        match self {
            Category::Safety => 0,
            Category::Privacy => 1,
            Category::Operational => 2,
            Category::Routing => 3,
            Category::Custom => 4,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Category::Safety => "SAFETY",
            Category::Privacy => "PRIVACY",
            Category::Operational => "OPERATIONAL",
            Category::Routing => "ROUTING",
            Category::Custom => "CUSTOM",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.keyword() == keyword)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
