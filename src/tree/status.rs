//! Read-only status derivation and leaf progress.
//!
//! Nothing here mutates the tree. Internal nodes are always evaluated from
//! their leaves, so these results never depend on cached stored statuses.

use super::{Node, Tree};
use crate::types::{LeafCount, NodeId, Status};
use std::collections::HashMap;

impl Tree {
    /// Effective status of `id`: its own status for a leaf, otherwise the
    /// aggregate of its children's effective statuses.
    pub fn compute_status(&self, id: &str) -> Option<Status> {
        self.find_node(id).map(|node| self.effective_status(node))
    }

    fn effective_status(&self, node: &Node) -> Status {
        if node.is_leaf() {
            return node.status;
        }
        Status::aggregate(self.children_of(&node.id).map(|child| self.effective_status(child)))
    }

    /// Done and total leaf counts under `id`. A leaf counts as one task.
    pub fn count_leaves(&self, id: &str) -> Option<LeafCount> {
        self.find_node(id).map(|node| self.leaf_count(node))
    }

    fn leaf_count(&self, node: &Node) -> LeafCount {
        if node.is_leaf() {
            return LeafCount::leaf(node.status);
        }
        self.children_of(&node.id)
            .map(|child| self.leaf_count(child))
            .fold(LeafCount::default(), |acc, c| acc + c)
    }

    /// Effective status and leaf count of every node in one post-order pass.
    pub fn derive_all(&self) -> HashMap<NodeId, (Status, LeafCount)> {
        let mut derived: HashMap<NodeId, (Status, LeafCount)> =
            HashMap::with_capacity(self.node_count());

        for id in self.post_order() {
            let node = &self.nodes[&id];
            let entry = if node.is_leaf() {
                (node.status, LeafCount::leaf(node.status))
            } else {
                let children: Vec<(Status, LeafCount)> = node
                    .children
                    .iter()
                    .filter_map(|child| derived.get(child).copied())
                    .collect();
                let status = Status::aggregate(children.iter().map(|(s, _)| *s));
                let count = children
                    .iter()
                    .fold(LeafCount::default(), |acc, (_, c)| acc + *c);
                (status, count)
            };
            derived.insert(id, entry);
        }
        derived
    }
}
