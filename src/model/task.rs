use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Advisory progress state of a task. Never affects layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Planned,
    InProgress,
    Done,
    Missing,
}

impl TaskStatus {
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::Planned,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Missing,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Planned => "Planned",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
            TaskStatus::Missing => "Missing",
        }
    }

    /// Lenient match used by importers ("in-progress", "Finished", ...).
    pub fn from_label(s: &str) -> Option<TaskStatus> {
        match s.trim().to_lowercase().as_str() {
            "planned" | "not started" | "not-started" | "new" | "open" => Some(TaskStatus::Planned),
            "in progress" | "in-progress" | "inprogress" | "active" | "started" => {
                Some(TaskStatus::InProgress)
            }
            "done" | "finished" | "complete" | "completed" => Some(TaskStatus::Done),
            "missing" | "overdue" | "blocked" => Some(TaskStatus::Missing),
            _ => None,
        }
    }
}

/// A single task or milestone in the plan. Children are owned exclusively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub start: NaiveDate,
    /// Inclusive end day. Equal to `start` for milestones.
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Forest::is_empty")]
    pub children: Forest,
}

impl Task {
    /// Create a new task; an `end` before `start` collapses to a milestone.
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start,
            end: end.max(start),
            assignee: None,
            status: TaskStatus::default(),
            children: Forest::default(),
        }
    }

    pub fn new_milestone(name: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(name, date, date)
    }

    pub fn with_children(mut self, children: Vec<Task>) -> Self {
        self.children = Forest::from(children);
        self
    }

    pub fn is_milestone(&self) -> bool {
        self.start == self.end
    }

    /// Length in days, counting both the start and the end day.
    pub fn duration_days(&self) -> i64 {
        super::date::day_diff(self.start, self.end) + 1
    }

    /// Shallow merge: children are carried over untouched.
    pub fn with_patch(&self, patch: &TaskPatch) -> Task {
        let mut task = self.clone();
        if let Some(name) = &patch.name {
            task.name = name.clone();
        }
        if let Some(start) = patch.start {
            task.start = start;
        }
        if let Some(end) = patch.end {
            task.end = end;
        }
        if let Some(assignee) = &patch.assignee {
            task.assignee = assignee.clone();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task
    }
}

/// A partial update of a task. Only the `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub assignee: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn start(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            ..Default::default()
        }
    }

    pub fn end(end: NaiveDate) -> Self {
        Self {
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &TaskPatch::default()
    }
}

/// An ordered list of tasks with structural sharing.
///
/// Cloning a `Forest` is a reference-count bump. Updates copy only the
/// nodes on the path from a root to the changed task; every other subtree
/// stays pointer-identical to the previous version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest(Arc<Vec<Arc<Task>>>);

impl Forest {
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Task>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Task>> {
        self.0.get(index)
    }

    /// True when both forests are the very same list.
    pub fn ptr_eq(a: &Forest, b: &Forest) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Every id in pre-order.
    pub fn ids(&self) -> Vec<Uuid> {
        flatten(self).map(|f| f.task.id).collect()
    }

    /// Ids that occur more than once anywhere in the tree.
    pub fn duplicate_ids(&self) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for flat in flatten(self) {
            if !seen.insert(flat.task.id) && !dupes.contains(&flat.task.id) {
                dupes.push(flat.task.id);
            }
        }
        dupes
    }

    /// Earliest start and latest end over the whole tree.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        flatten(self).fold(None, |acc, f| match acc {
            None => Some((f.task.start, f.task.end)),
            Some((lo, hi)) => Some((lo.min(f.task.start), hi.max(f.task.end))),
        })
    }

    /// Append a top-level task.
    pub fn push_root(&self, task: Task) -> Forest {
        let mut nodes = self.0.as_ref().clone();
        nodes.push(Arc::new(task));
        Forest(Arc::new(nodes))
    }

    /// Append `task` as the last child of `parent_id`. Returns `self`
    /// unchanged (same list) when the parent does not exist.
    pub fn insert_child(&self, parent_id: Uuid, task: Task) -> Forest {
        let mut task = Some(task);
        self.rewrite(parent_id, &mut |parent: &Task| {
            let mut parent = parent.clone();
            if let Some(child) = task.take() {
                parent.children = parent.children.push_root(child);
            }
            parent
        })
        .unwrap_or_else(|| self.clone())
    }

    /// Remove a task together with its subtree. Returns `self` unchanged
    /// when `id` is unknown.
    pub fn remove(&self, id: Uuid) -> Forest {
        self.without(id).unwrap_or_else(|| self.clone())
    }

    fn without(&self, id: Uuid) -> Option<Forest> {
        if let Some(pos) = self.0.iter().position(|t| t.id == id) {
            let mut nodes = self.0.as_ref().clone();
            nodes.remove(pos);
            return Some(Forest(Arc::new(nodes)));
        }
        self.0.iter().enumerate().find_map(|(i, task)| {
            let children = task.children.without(id)?;
            Some(self.replaced(i, Task { children, ..Task::clone(task) }))
        })
    }

    /// Copy-on-write edit of the first task (pre-order) matching `id`.
    fn rewrite(&self, id: Uuid, edit: &mut dyn FnMut(&Task) -> Task) -> Option<Forest> {
        for (i, task) in self.0.iter().enumerate() {
            if task.id == id {
                return Some(self.replaced(i, edit(task.as_ref())));
            }
            if let Some(children) = task.children.rewrite(id, edit) {
                return Some(self.replaced(i, Task { children, ..Task::clone(task) }));
            }
        }
        None
    }

    fn replaced(&self, index: usize, task: Task) -> Forest {
        let mut nodes = self.0.as_ref().clone();
        nodes[index] = Arc::new(task);
        Forest(Arc::new(nodes))
    }
}

impl From<Vec<Task>> for Forest {
    fn from(tasks: Vec<Task>) -> Self {
        Forest(Arc::new(tasks.into_iter().map(Arc::new).collect()))
    }
}

impl FromIterator<Task> for Forest {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Forest(Arc::new(iter.into_iter().map(Arc::new).collect()))
    }
}

/// A task together with its nesting level (0 for top-level tasks).
#[derive(Debug, Clone, Copy)]
pub struct FlatTask<'a> {
    pub task: &'a Task,
    pub depth: usize,
}

/// Lazy pre-order walk over a [`Forest`]. Clone it to restart from the
/// same position.
#[derive(Debug, Clone)]
pub struct Flatten<'a> {
    stack: Vec<std::slice::Iter<'a, Arc<Task>>>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = FlatTask<'a>;

    fn next(&mut self) -> Option<FlatTask<'a>> {
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            match self.stack[depth].next() {
                Some(task) => {
                    if !task.children.is_empty() {
                        self.stack.push(task.children.iter());
                    }
                    return Some(FlatTask {
                        task: task.as_ref(),
                        depth,
                    });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Depth-first pre-order projection of the tree: a parent always comes
/// immediately before its subtree, siblings keep their order.
pub fn flatten(forest: &Forest) -> Flatten<'_> {
    Flatten {
        stack: vec![forest.iter()],
    }
}

/// First task (pre-order) with the given id.
pub fn find_by_id(forest: &Forest, id: Uuid) -> Option<&Task> {
    flatten(forest).map(|f| f.task).find(|t| t.id == id)
}

/// Return a new forest with `patch` merged into the task matching `id`.
///
/// Subtrees that do not contain the task are shared with `forest`. When
/// nothing matches, the returned forest is `forest` itself, so callers can
/// detect a no-op with [`Forest::ptr_eq`].
pub fn apply_change(forest: &Forest, id: Uuid, patch: &TaskPatch) -> Forest {
    forest
        .rewrite(id, &mut |task: &Task| task.with_patch(patch))
        .unwrap_or_else(|| forest.clone())
}
