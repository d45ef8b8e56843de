//! Clause and action AST definitions

use super::condition::Condition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A clause: when `condition` holds, `actions` apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Clause ID, unique within its policy
    pub id: String,

    /// Clauses of the same policy that must be evaluated before this one
    #[serde(default)]
    pub after: Vec<String>,

    /// Condition under which the clause matches
    pub condition: Condition,

    /// Actions associated with a match
    pub actions: Vec<Action>,

    /// Ask the executor to stop after this policy when the clause matches
    #[serde(default)]
    pub halt: bool,
}

impl Clause {
    /// Create a new clause
    pub fn new(id: impl Into<String>, condition: Condition, actions: Vec<Action>) -> Self {
        Clause {
            id: id.into(),
            after: Vec::new(),
            condition,
            actions,
            halt: false,
        }
    }

    /// Set the declared dependencies
    pub fn with_after(mut self, after: Vec<String>) -> Self {
        self.after = after;
        self
    }

    /// Mark the clause as halting
    pub fn halting(mut self) -> Self {
        self.halt = true;
        self
    }
}

/// Action associated with a clause
///
/// Actions are descriptive: they carry clause-scoped metadata and are never
/// executed by the toolchain itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Record a warning
    Warn { message: Option<String> },
    /// Block the operation
    Block { reason: Option<String> },
    /// Route the operation to an approver
    RequireApproval { reason: Option<String> },
    /// Explicitly permit the operation
    Allow { reason: Option<String> },
}

/// The kind of an action without its metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Warn,
    Block,
    RequireApproval,
    Allow,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Warn { .. } => ActionKind::Warn,
            Action::Block { .. } => ActionKind::Block,
            Action::RequireApproval { .. } => ActionKind::RequireApproval,
            Action::Allow { .. } => ActionKind::Allow,
        }
    }

    /// The message or reason attached to the action
    pub fn detail(&self) -> Option<&str> {
        match self {
            Action::Warn { message } => message.as_deref(),
            Action::Block { reason }
            | Action::RequireApproval { reason }
            | Action::Allow { reason } => reason.as_deref(),
        }
    }

    /// Build an action of the given kind
    pub fn of_kind(kind: ActionKind, detail: Option<String>) -> Self {
        match kind {
            ActionKind::Warn => Action::Warn { message: detail },
            ActionKind::Block => Action::Block { reason: detail },
            ActionKind::RequireApproval => Action::RequireApproval { reason: detail },
            ActionKind::Allow => Action::Allow { reason: detail },
        }
    }
}

impl ActionKind {
    /// DSL keyword for this action
    pub fn keyword(&self) -> &'static str {
        match self {
            ActionKind::Warn => "WARN",
            ActionKind::Block => "BLOCK",
            ActionKind::RequireApproval => "REQUIRE_APPROVAL",
            ActionKind::Allow => "ALLOW",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "WARN" => Some(ActionKind::Warn),
            "BLOCK" => Some(ActionKind::Block),
            "REQUIRE_APPROVAL" => Some(ActionKind::RequireApproval),
            "ALLOW" => Some(ActionKind::Allow),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
