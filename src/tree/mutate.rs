//! Node-level mutations and status propagation.
//!
//! Every mutation validates first and touches the arena only once it is
//! known to succeed, then re-stamps derived statuses via [`Tree::sync_statuses`].

use super::Tree;
use crate::error::{CoreError, CoreResult};
use crate::types::{NodeId, Status};
use tracing::debug;

/// Trim `value` and reject it if nothing is left.
pub(crate) fn required_text(field: &str, value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::missing_field(field));
    }
    Ok(trimmed.to_string())
}

impl Tree {
    /// Append a new leaf under `parent` (the root when `None`).
    pub fn add_node(
        &mut self,
        parent: Option<&str>,
        title: &str,
        description: &str,
        status: Status,
    ) -> CoreResult<NodeId> {
        let title = required_text("title", title)?;
        let parent = parent.unwrap_or(self.root.as_str()).to_string();

        let id = self
            .attach_leaf(&parent, title, description.trim().to_string(), status)
            .ok_or_else(|| CoreError::node_not_found(&parent))?;
        self.sync_statuses();
        Ok(id)
    }

    /// Update title and description; update status only if the node is a
    /// leaf. Returns whether the status was applied.
    pub fn edit_node(
        &mut self,
        id: &str,
        title: &str,
        description: &str,
        status: Status,
    ) -> CoreResult<bool> {
        let title = required_text("title", title)?;
        let node = self
            .node_mut(id)
            .ok_or_else(|| CoreError::node_not_found(id))?;

        node.title = title;
        node.description = description.trim().to_string();
        let status_applied = node.is_leaf();
        if status_applied {
            node.status = status;
        }

        self.sync_statuses();
        Ok(status_applied)
    }

    /// Remove `id` and its whole subtree. Returns the number of nodes removed.
    pub fn delete_node(&mut self, id: &str) -> CoreResult<usize> {
        if id == self.root {
            return Err(CoreError::invalid_target(
                id,
                "the project root is removed only with its project",
            ));
        }
        if !self.contains(id) {
            return Err(CoreError::node_not_found(id));
        }

        let removed = self.detach_subtree(id);
        self.sync_statuses();
        Ok(removed)
    }

    /// Advance a leaf through todo -> doing -> review -> done -> todo.
    pub fn cycle_status(&mut self, id: &str) -> CoreResult<Status> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| CoreError::node_not_found(id))?;
        if !node.is_leaf() {
            return Err(CoreError::invalid_target(
                id,
                "status of a node with children is derived from them",
            ));
        }

        node.status = node.status.next();
        let status = node.status;
        self.sync_statuses();
        Ok(status)
    }

    /// Flip the display-only collapsed flag. Returns the new value.
    pub fn toggle_collapsed(&mut self, id: &str) -> CoreResult<bool> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| CoreError::node_not_found(id))?;
        node.collapsed = !node.collapsed;
        Ok(node.collapsed)
    }

    pub(crate) fn set_root_title(&mut self, title: String) {
        let root = self.root.clone();
        if let Some(node) = self.node_mut(&root) {
            node.title = title;
        }
    }

    /// Overwrite every internal node's stored status with its derived value.
    ///
    /// Runs children before parents so each parent aggregates already-synced
    /// children. Leaves are left alone. Returns how many stored statuses changed.
    pub fn sync_statuses(&mut self) -> usize {
        let mut changed = 0;
        for id in self.post_order() {
            let node = &self.nodes[&id];
            if node.is_leaf() {
                continue;
            }
            let derived = Status::aggregate(
                node.children
                    .iter()
                    .filter_map(|child| self.nodes.get(child))
                    .map(|child| child.status),
            );
            if let Some(node) = self.nodes.get_mut(&id)
                && node.status != derived
            {
                node.status = derived;
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(changed, "Propagated derived statuses");
        }
        changed
    }
}
