//! Core types for the treeflow task tracker.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a node within a project.
pub type NodeId = String;

/// Identifier of a project within the registry.
pub type ProjectId = String;

/// Generate a fresh opaque identifier.
///
/// UUID v7 carries a millisecond timestamp followed by random bits, so ids
/// are unique across a session and sort by creation time.
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Workflow status of a node.
///
/// Authoritative for leaves. For internal nodes the stored value is a cache
/// of [`Status::aggregate`] over the children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    Doing,
    Review,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::Doing => "doing",
            Status::Review => "review",
            Status::Done => "done",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Todo => "To Do",
            Status::Doing => "Doing",
            Status::Review => "Review",
            Status::Done => "Done",
        }
    }

    /// Next status in the cycle todo -> doing -> review -> done -> todo.
    pub fn next(self) -> Self {
        match self {
            Status::Todo => Status::Doing,
            Status::Doing => Status::Review,
            Status::Review => Status::Done,
            Status::Done => Status::Todo,
        }
    }

    /// Combine the effective statuses of a node's children.
    ///
    /// All done wins outright; otherwise doing beats review beats todo.
    /// An empty iterator yields `Done` (vacuous truth); callers only apply
    /// this to nodes that have children.
    pub fn aggregate<I>(children: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        let mut all_done = true;
        let mut any_doing = false;
        let mut any_review = false;
        for status in children {
            match status {
                Status::Done => {}
                Status::Doing => {
                    all_done = false;
                    any_doing = true;
                }
                Status::Review => {
                    all_done = false;
                    any_review = true;
                }
                Status::Todo => all_done = false,
            }
        }

        if all_done {
            Status::Done
        } else if any_doing {
            Status::Doing
        } else if any_review {
            Status::Review
        } else {
            Status::Todo
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "to do" | "to-do" => Ok(Status::Todo),
            "doing" => Ok(Status::Doing),
            "review" => Ok(Status::Review),
            "done" => Ok(Status::Done),
            other => Err(CoreError::invalid_value(
                "status",
                &format!("unknown status '{}' (expected todo, doing, review or done)", other),
            )),
        }
    }
}

/// Leaf progress for a subtree: how many leaf tasks exist and how many are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeafCount {
    pub done: usize,
    pub total: usize,
}

impl LeafCount {
    /// Count contributed by a single leaf.
    pub fn leaf(status: Status) -> Self {
        Self {
            done: usize::from(status == Status::Done),
            total: 1,
        }
    }

    /// Completion as a whole percentage, rounded to nearest.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.done as f64 / self.total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

impl Add for LeafCount {
    type Output = LeafCount;

    fn add(self, rhs: Self) -> Self::Output {
        LeafCount {
            done: self.done + rhs.done,
            total: self.total + rhs.total,
        }
    }
}

impl AddAssign for LeafCount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl fmt::Display for LeafCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

// =============================================================================
// Persisted shapes
// =============================================================================

fn is_false(value: &bool) -> bool {
    !*value
}

/// A node as it appears in the persisted registry: nested, children inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    /// Older writers used `_collapsed`; read but never written.
    #[serde(default, rename = "_collapsed", skip_serializing)]
    pub legacy_collapsed: bool,
}

impl NodeRecord {
    /// Collapsed under either spelling.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed || self.legacy_collapsed
    }
}

/// A project as it appears in the persisted registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    pub root: NodeRecord,
}

/// The whole persisted registry value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

// =============================================================================
// Query views
// =============================================================================

/// Project listing entry with derived status and leaf progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub created_at: i64,
    pub status: Status,
    pub progress: LeafCount,
    pub active: bool,
}

/// Owned snapshot of a subtree, with derived status and progress per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub status: Status,
    pub progress: LeafCount,
    pub collapsed: bool,
    pub depth: usize,
    pub children: Vec<NodeView>,
}

impl NodeView {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
