//! The board: a registry bound to its storage.
//!
//! Collaborators talk to the core only through [`Board`]. Each command runs
//! against the registry and, if it succeeds, the whole registry is persisted
//! before the command returns. A rejected command or a failed write leaves
//! the in-memory registry exactly as it was.

use crate::error::CoreResult;
use crate::registry::{Project, Registry};
use crate::store::{self, Storage};
use crate::tree::{Node, Tree};
use crate::types::{LeafCount, NodeId, NodeView, ProjectId, ProjectSummary, Status};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

pub struct Board {
    registry: Registry,
    storage: Box<dyn Storage>,
}

impl Board {
    /// Load the registry from `storage` (empty if absent or corrupt).
    pub fn open<S: Storage + 'static>(storage: S) -> Self {
        let registry = store::load_registry(&storage);
        info!(
            projects = registry.len(),
            active = registry.active_id().unwrap_or("-"),
            "Board opened"
        );
        Self {
            registry,
            storage: Box::new(storage),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_shared(self) -> SharedBoard {
        SharedBoard::new(self)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn active_project(&self) -> Option<&Project> {
        self.registry.active_project()
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.registry.project(id)
    }

    pub fn list_projects(&self) -> Vec<ProjectSummary> {
        self.registry.summaries()
    }

    /// Live derived status of a node.
    pub fn node_status(&self, project_id: &str, node_id: &str) -> Option<Status> {
        self.registry
            .project(project_id)
            .and_then(|p| p.tree().compute_status(node_id))
    }

    pub fn node_progress(&self, project_id: &str, node_id: &str) -> Option<LeafCount> {
        self.registry
            .project(project_id)
            .and_then(|p| p.tree().count_leaves(node_id))
    }

    /// Nested snapshot of the subtree at `node_id` (the root when `None`).
    pub fn node_view(&self, project_id: &str, node_id: Option<&str>) -> Option<NodeView> {
        let tree = self.registry.project(project_id)?.tree();
        let start = tree.find_node(node_id.unwrap_or(tree.root_id()))?;
        let depth = tree.depth(start.id())?;
        let derived = tree.derive_all();
        debug!(project = project_id, node = start.id(), "Building node view");
        Some(build_view(tree, &derived, start, depth))
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Select the active project. Selection is not persisted.
    pub fn select_project(&mut self, id: &str) -> CoreResult<()> {
        self.registry.select_project(id)?;
        debug!(project = id, "Selected project");
        Ok(())
    }

    pub fn create_project(&mut self, name: &str) -> CoreResult<ProjectId> {
        self.commit("create_project", |r| r.create_project(name))
    }

    pub fn rename_project(&mut self, id: &str, name: &str) -> CoreResult<()> {
        self.commit("rename_project", |r| r.rename_project(id, name))
    }

    /// Irreversibly remove a project; callers confirm with the user first.
    pub fn delete_project(&mut self, id: &str) -> CoreResult<Project> {
        self.commit("delete_project", |r| r.delete_project(id))
    }

    pub fn add_node(
        &mut self,
        project_id: &str,
        parent: Option<&str>,
        title: &str,
        description: &str,
        status: Status,
    ) -> CoreResult<NodeId> {
        self.commit("add_node", |r| {
            r.add_node(project_id, parent, title, description, status)
        })
    }

    pub fn edit_node(
        &mut self,
        project_id: &str,
        node_id: &str,
        title: &str,
        description: &str,
        status: Status,
    ) -> CoreResult<bool> {
        self.commit("edit_node", |r| {
            r.edit_node(project_id, node_id, title, description, status)
        })
    }

    pub fn delete_node(&mut self, project_id: &str, node_id: &str) -> CoreResult<usize> {
        self.commit("delete_node", |r| r.delete_node(project_id, node_id))
    }

    pub fn cycle_status(&mut self, project_id: &str, node_id: &str) -> CoreResult<Status> {
        self.commit("cycle_status", |r| r.cycle_status(project_id, node_id))
    }

    pub fn toggle_collapsed(&mut self, project_id: &str, node_id: &str) -> CoreResult<bool> {
        self.commit("toggle_collapsed", |r| r.toggle_collapsed(project_id, node_id))
    }

    /// Run `op`, persist on success, restore the prior registry on any failure.
    fn commit<T, F>(&mut self, action: &'static str, op: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Registry) -> CoreResult<T>,
    {
        let snapshot = self.registry.clone();

        let out = match op(&mut self.registry) {
            Ok(out) => out,
            Err(e) => {
                if e.is_user_error() {
                    debug!(action, code = ?e.code, error = %e, "Command rejected");
                } else {
                    warn!(action, code = ?e.code, error = %e, "Command failed");
                }
                self.registry = snapshot;
                return Err(e);
            }
        };

        if let Err(e) = store::save_registry(self.storage.as_mut(), &self.registry) {
            warn!(action, error = %e, "Failed to persist registry, rolling back");
            self.registry = snapshot;
            return Err(e.into());
        }

        info!(action, "Command committed");
        Ok(out)
    }
}

fn build_view(
    tree: &Tree,
    derived: &HashMap<NodeId, (Status, LeafCount)>,
    node: &Node,
    depth: usize,
) -> NodeView {
    let (status, progress) = derived.get(node.id()).copied().unwrap_or_default();
    NodeView {
        id: node.id().to_string(),
        title: node.title().to_string(),
        description: node.description().to_string(),
        status,
        progress,
        collapsed: node.collapsed(),
        depth,
        children: tree
            .children_of(node.id())
            .map(|child| build_view(tree, derived, child, depth + 1))
            .collect(),
    }
}

/// A board shared between threads. Each call holds the lock for the whole
/// command, persistence included.
#[derive(Clone)]
pub struct SharedBoard {
    inner: Arc<Mutex<Board>>,
}

impl SharedBoard {
    pub fn new(board: Board) -> Self {
        Self {
            inner: Arc::new(Mutex::new(board)),
        }
    }

    /// Execute a function with exclusive access to the board.
    pub fn with_board<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Board) -> T,
    {
        let mut board = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut board)
    }
}
