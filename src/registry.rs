//! Projects and the registry that holds them.
//!
//! A [`Project`] pairs a name with its [`Tree`]; the project name and the root
//! node's title are kept identical. The [`Registry`] keeps projects in
//! creation order plus an optional active selection.

use crate::error::{CoreError, CoreResult};
use crate::tree::Tree;
use crate::tree::mutate::required_text;
use crate::types::{
    LeafCount, NodeId, ProjectId, ProjectRecord, ProjectSummary, RegistryRecord, Status,
    generate_id, now_ms,
};
use std::collections::HashSet;
use tracing::warn;

/// A named tree of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    name: String,
    created_at: i64,
    tree: Tree,
}

impl Project {
    /// Create a project whose root node carries the same (trimmed) name.
    pub fn new(name: &str) -> CoreResult<Self> {
        let name = required_text("name", name)?;
        Ok(Self {
            id: generate_id(),
            tree: Tree::new(name.clone()),
            name,
            created_at: now_ms(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Derived status of the whole project.
    pub fn status(&self) -> Status {
        self.tree.compute_status(self.tree.root_id()).unwrap_or_default()
    }

    pub fn progress(&self) -> LeafCount {
        self.tree.count_leaves(self.tree.root_id()).unwrap_or_default()
    }

    /// Rename the project and its root node together.
    pub fn rename(&mut self, name: &str) -> CoreResult<()> {
        let name = required_text("name", name)?;
        self.tree.set_root_title(name.clone());
        self.name = name;
        Ok(())
    }

    pub fn add_node(
        &mut self,
        parent: Option<&str>,
        title: &str,
        description: &str,
        status: Status,
    ) -> CoreResult<NodeId> {
        self.tree.add_node(parent, title, description, status)
    }

    /// Edit a node. Editing the root's title renames the project.
    pub fn edit_node(
        &mut self,
        node_id: &str,
        title: &str,
        description: &str,
        status: Status,
    ) -> CoreResult<bool> {
        let applied = self.tree.edit_node(node_id, title, description, status)?;
        if node_id == self.tree.root_id() {
            self.name = self.tree.root().title().to_string();
        }
        Ok(applied)
    }

    pub fn delete_node(&mut self, node_id: &str) -> CoreResult<usize> {
        self.tree.delete_node(node_id)
    }

    pub fn cycle_status(&mut self, node_id: &str) -> CoreResult<Status> {
        self.tree.cycle_status(node_id)
    }

    pub fn toggle_collapsed(&mut self, node_id: &str) -> CoreResult<bool> {
        self.tree.toggle_collapsed(node_id)
    }

    pub fn to_record(&self) -> ProjectRecord {
        ProjectRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            root: self.tree.to_record(),
        }
    }

    /// Rebuild a project from its record, restoring the name/root-title
    /// invariant and re-deriving cached statuses.
    pub fn from_record(record: ProjectRecord) -> Self {
        let mut tree = Tree::from_record(record.root);
        let name = [record.name.trim(), tree.root().title().trim()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .unwrap_or("Untitled")
            .to_string();
        tree.set_root_title(name.clone());
        tree.sync_statuses();

        Self {
            id: record.id,
            name,
            created_at: record.created_at,
            tree,
        }
    }
}

/// Ordered collection of projects plus the active selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    projects: Vec<Project>,
    active: Option<ProjectId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn project_mut(&mut self, id: &str) -> CoreResult<&mut Project> {
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::project_not_found(id))
    }

    /// Find a project by exact id, falling back to an exact name match.
    pub fn find_project(&self, id_or_name: &str) -> Option<&Project> {
        self.project(id_or_name).or_else(|| {
            let name = id_or_name.trim();
            self.projects.iter().find(|p| p.name == name)
        })
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.active.as_deref().and_then(|id| self.project(id))
    }

    /// Make `id` the active project. Pure selection; no tree changes.
    pub fn select_project(&mut self, id: &str) -> CoreResult<()> {
        if self.project(id).is_none() {
            return Err(CoreError::project_not_found(id));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    /// Append a new project and make it active.
    pub fn create_project(&mut self, name: &str) -> CoreResult<ProjectId> {
        let project = Project::new(name)?;
        let id = project.id.clone();
        self.projects.push(project);
        self.active = Some(id.clone());
        Ok(id)
    }

    pub fn rename_project(&mut self, id: &str, name: &str) -> CoreResult<()> {
        self.project_mut(id)?.rename(name)
    }

    /// Remove a project. If it was active, the first remaining project (or
    /// none) becomes active. Returns the removed project.
    pub fn delete_project(&mut self, id: &str) -> CoreResult<Project> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::project_not_found(id))?;
        let removed = self.projects.remove(index);

        if self.active.as_deref() == Some(id) {
            self.active = self.projects.first().map(|p| p.id.clone());
        }
        Ok(removed)
    }

    pub fn add_node(
        &mut self,
        project_id: &str,
        parent: Option<&str>,
        title: &str,
        description: &str,
        status: Status,
    ) -> CoreResult<NodeId> {
        self.project_mut(project_id)?
            .add_node(parent, title, description, status)
    }

    pub fn edit_node(
        &mut self,
        project_id: &str,
        node_id: &str,
        title: &str,
        description: &str,
        status: Status,
    ) -> CoreResult<bool> {
        self.project_mut(project_id)?
            .edit_node(node_id, title, description, status)
    }

    pub fn delete_node(&mut self, project_id: &str, node_id: &str) -> CoreResult<usize> {
        self.project_mut(project_id)?.delete_node(node_id)
    }

    pub fn cycle_status(&mut self, project_id: &str, node_id: &str) -> CoreResult<Status> {
        self.project_mut(project_id)?.cycle_status(node_id)
    }

    pub fn toggle_collapsed(&mut self, project_id: &str, node_id: &str) -> CoreResult<bool> {
        self.project_mut(project_id)?.toggle_collapsed(node_id)
    }

    /// Every project with its derived status and leaf progress.
    pub fn summaries(&self) -> Vec<ProjectSummary> {
        self.projects
            .iter()
            .map(|p| ProjectSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                created_at: p.created_at,
                status: p.status(),
                progress: p.progress(),
                active: self.active.as_deref() == Some(p.id.as_str()),
            })
            .collect()
    }

    /// Persisted shape. The active selection is not persisted.
    pub fn to_record(&self) -> RegistryRecord {
        RegistryRecord {
            projects: self.projects.iter().map(Project::to_record).collect(),
        }
    }

    /// Rebuild from a persisted record. The first project becomes active.
    pub fn from_record(record: RegistryRecord) -> Self {
        let mut seen: HashSet<ProjectId> = HashSet::new();
        let projects: Vec<Project> = record
            .projects
            .into_iter()
            .map(|mut rec| {
                if rec.id.trim().is_empty() || seen.contains(&rec.id) {
                    let fresh = generate_id();
                    warn!(old_id = %rec.id, new_id = %fresh, "Reassigning duplicate project id");
                    rec.id = fresh;
                }
                seen.insert(rec.id.clone());
                Project::from_record(rec)
            })
            .collect();

        let active = projects.first().map(|p| p.id.clone());
        Self { projects, active }
    }
}
