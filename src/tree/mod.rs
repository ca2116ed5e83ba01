//! Arena-backed node store for a single project tree.
//!
//! Nodes live in a map keyed by id. Each node records its parent and an
//! ordered list of child ids, so lookups, subtree removal and ancestor walks
//! never need to search the whole tree.

pub mod mutate;
pub mod status;

use crate::types::{NodeId, NodeRecord, Status, generate_id};
use std::collections::HashMap;
use tracing::warn;

/// A single task node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) status: Status,
    pub(crate) collapsed: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    fn new(
        id: NodeId,
        title: String,
        description: String,
        status: Status,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            status,
            collapsed: false,
            parent,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Stored status. For internal nodes this is the cached derived value;
    /// use [`Tree::compute_status`] for the live one.
    pub fn stored_status(&self) -> Status {
        self.status
    }

    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn child_ids(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// One project's tree. The root is always present and never has a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
}

impl Tree {
    /// Create a tree holding only a `todo` root with a fresh id.
    pub fn new(root_title: impl Into<String>) -> Self {
        Self::with_root_id(generate_id(), root_title)
    }

    pub fn with_root_id(root_id: impl Into<NodeId>, root_title: impl Into<String>) -> Self {
        let root_id = root_id.into();
        let root = Node::new(
            root_id.clone(),
            root_title.into(),
            String::new(),
            Status::Todo,
            None,
        );
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), root);
        Self {
            root: root_id,
            nodes,
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> &Node {
        // The root entry is inserted on construction and never removed.
        &self.nodes[&self.root]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node reachable from the root.
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// The node that directly contains `child_id`. `None` for the root or an
    /// unknown id.
    pub fn find_parent_of(&self, child_id: &str) -> Option<&Node> {
        self.nodes
            .get(child_id)
            .and_then(|node| node.parent.as_deref())
            .and_then(|parent| self.nodes.get(parent))
    }

    /// Direct children of `id` in order. Empty for unknown ids.
    pub fn children_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(move |node| node.children.iter().filter_map(move |c| self.nodes.get(c)))
    }

    /// Ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: &str) -> Vec<&Node> {
        let mut path = Vec::new();
        let mut cursor = self.find_parent_of(id);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.find_parent_of(&node.id);
        }
        path
    }

    /// Distance from the root; the root itself is at depth 0.
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.contains(id).then(|| self.ancestors(id).len())
    }

    /// Every node id, children before their parent, siblings in order.
    pub fn post_order(&self) -> Vec<NodeId> {
        self.subtree_post_order(&self.root)
    }

    /// Ids of the subtree rooted at `id` in post-order. Empty for unknown ids.
    pub(crate) fn subtree_post_order(&self, id: &str) -> Vec<NodeId> {
        let Some(start) = self.nodes.get(id) else {
            return Vec::new();
        };

        let mut order = Vec::new();
        let mut stack: Vec<(&Node, bool)> = vec![(start, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                order.push(node.id.clone());
                continue;
            }
            stack.push((node, true));
            for child in node.children.iter().rev() {
                if let Some(child) = self.nodes.get(child) {
                    stack.push((child, false));
                }
            }
        }
        order
    }

    /// Append a new leaf under `parent`. Returns `None` if the parent is unknown.
    pub(crate) fn attach_leaf(
        &mut self,
        parent: &str,
        title: String,
        description: String,
        status: Status,
    ) -> Option<NodeId> {
        let id = generate_id();
        let parent_node = self.nodes.get_mut(parent)?;
        parent_node.children.push(id.clone());
        let node = Node::new(id.clone(), title, description, status, Some(parent.to_string()));
        self.nodes.insert(id.clone(), node);
        Some(id)
    }

    /// Unlink the subtree rooted at `id` and drop all of its nodes.
    /// Returns the number of nodes removed; the root is never removed.
    pub(crate) fn detach_subtree(&mut self, id: &str) -> usize {
        if id == self.root {
            return 0;
        }
        let doomed = self.subtree_post_order(id);
        if doomed.is_empty() {
            return 0;
        }

        let parent = self.nodes.get(id).and_then(|node| node.parent.clone());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| child != id);
        }
        for node_id in &doomed {
            self.nodes.remove(node_id);
        }
        doomed.len()
    }

    /// Nested record for persistence.
    pub fn to_record(&self) -> NodeRecord {
        self.record_for(&self.root)
    }

    fn record_for(&self, id: &str) -> NodeRecord {
        let node = &self.nodes[id];
        NodeRecord {
            id: node.id.clone(),
            title: node.title.clone(),
            description: node.description.clone(),
            status: node.status,
            children: node
                .children
                .iter()
                .map(|child| self.record_for(child))
                .collect(),
            collapsed: node.collapsed,
            legacy_collapsed: false,
        }
    }

    /// Rebuild a tree from its nested record.
    ///
    /// A blank or repeated id is replaced with a fresh one so the arena stays
    /// keyed uniquely. Stored statuses are taken as-is; callers re-sync.
    pub fn from_record(record: NodeRecord) -> Self {
        let mut nodes: HashMap<NodeId, Node> = HashMap::new();
        let mut root: Option<NodeId> = None;
        let mut stack: Vec<(NodeRecord, Option<NodeId>)> = vec![(record, None)];

        while let Some((rec, parent)) = stack.pop() {
            let id = if rec.id.trim().is_empty() || nodes.contains_key(&rec.id) {
                let fresh = generate_id();
                warn!(old_id = %rec.id, new_id = %fresh, "Reassigning duplicate node id");
                fresh
            } else {
                rec.id.clone()
            };

            match parent.as_deref().and_then(|p| nodes.get_mut(p)) {
                Some(parent_node) => parent_node.children.push(id.clone()),
                None => root = Some(id.clone()),
            }

            let collapsed = rec.is_collapsed();
            let mut node = Node::new(id.clone(), rec.title, rec.description, rec.status, parent);
            node.collapsed = collapsed;
            nodes.insert(id.clone(), node);

            for child in rec.children.into_iter().rev() {
                stack.push((child, Some(id.clone())));
            }
        }

        // The first record popped is the root, so `root` is always set here.
        let root = root.unwrap_or_default();
        Self { root, nodes }
    }
}
