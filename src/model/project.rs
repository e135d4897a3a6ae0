use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dependency::Dependency;
use super::task::{apply_change, find_by_id, Forest, TaskPatch};

/// A project plan: the task tree, its dependencies, and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub tasks: Forest,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: "Untitled Plan".to_string(),
            tasks: Forest::default(),
            dependencies: Vec::new(),
            created: Utc::now(),
            modified: Utc::now(),
        }
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    /// Apply a patch and report whether anything matched.
    pub fn apply(&mut self, id: Uuid, patch: &TaskPatch) -> bool {
        let updated = apply_change(&self.tasks, id, patch);
        if Forest::ptr_eq(&updated, &self.tasks) {
            return false;
        }
        self.tasks = updated;
        self.touch();
        true
    }

    /// Delete a task and its subtree, then drop edges that lost an endpoint.
    pub fn remove_task(&mut self, id: Uuid) -> bool {
        let updated = self.tasks.remove(id);
        if Forest::ptr_eq(&updated, &self.tasks) {
            return false;
        }
        self.tasks = updated;
        self.prune_dependencies();
        self.touch();
        true
    }

    /// Add a finish-to-start edge unless it is a self-loop, refers to an
    /// unknown task, or already exists.
    pub fn add_dependency(&mut self, from: Uuid, to: Uuid) -> bool {
        if from == to
            || find_by_id(&self.tasks, from).is_none()
            || find_by_id(&self.tasks, to).is_none()
            || self
                .dependencies
                .iter()
                .any(|d| d.from_task == from && d.to_task == to)
        {
            return false;
        }
        self.dependencies.push(Dependency::new(from, to));
        self.touch();
        true
    }

    /// Drop edges whose endpoints no longer exist in the tree.
    pub fn prune_dependencies(&mut self) {
        let ids: HashSet<Uuid> = self.tasks.ids().into_iter().collect();
        self.dependencies
            .retain(|d| ids.contains(&d.from_task) && ids.contains(&d.to_task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn removing_parent_prunes_edges_of_subtree() {
        let child = Task::new("formwork", d(2024, 3, 1), d(2024, 3, 3));
        let parent =
            Task::new("slab", d(2024, 3, 1), d(2024, 3, 8)).with_children(vec![child.clone()]);
        let other = Task::new("walls", d(2024, 3, 9), d(2024, 3, 20));

        let mut project = Project::new("Block A");
        project.tasks = Forest::from(vec![parent.clone(), other.clone()]);
        assert!(project.add_dependency(child.id, other.id));
        assert!(project.add_dependency(parent.id, other.id));

        assert!(project.remove_task(parent.id));
        assert_eq!(project.tasks.len(), 1);
        assert!(project.dependencies.is_empty());
        assert!(!project.remove_task(parent.id));
    }

    #[test]
    fn add_dependency_rejects_duplicates_and_loops() {
        let a = Task::new("a", d(2024, 3, 1), d(2024, 3, 3));
        let b = Task::new("b", d(2024, 3, 4), d(2024, 3, 6));
        let mut project = Project::new("p");
        project.tasks = Forest::from(vec![a.clone(), b.clone()]);

        assert!(project.add_dependency(a.id, b.id));
        assert!(!project.add_dependency(a.id, b.id));
        assert!(!project.add_dependency(a.id, a.id));
        assert!(!project.add_dependency(a.id, Uuid::new_v4()));
        assert_eq!(project.dependencies.len(), 1);
    }

    #[test]
    fn apply_reports_unknown_ids() {
        let a = Task::new("a", d(2024, 3, 1), d(2024, 3, 3));
        let mut project = Project::new("p");
        project.tasks = Forest::from(vec![a.clone()]);

        assert!(!project.apply(Uuid::new_v4(), &TaskPatch::end(d(2024, 3, 9))));
        assert!(project.apply(a.id, &TaskPatch::end(d(2024, 3, 9))));
        assert_eq!(find_by_id(&project.tasks, a.id).unwrap().end, d(2024, 3, 9));
    }

    #[test]
    fn json_round_trip_keeps_tree() {
        let child = Task::new("rebar", d(2024, 3, 2), d(2024, 3, 4));
        let parent = Task::new("footings", d(2024, 3, 1), d(2024, 3, 5))
            .with_children(vec![child.clone()]);
        let mut project = Project::new("Tower");
        project.tasks = Forest::from(vec![parent]);

        let json = serde_json::to_string(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tasks.ids(), project.tasks.ids());
        assert_eq!(find_by_id(&back.tasks, child.id).unwrap().name, "rebar");
    }
}
