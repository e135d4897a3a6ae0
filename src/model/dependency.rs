use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Task;

/// The kind of ordering constraint an edge expresses.
///
/// Only finish-to-start exists today; the field is kept so stored plans
/// stay readable once more kinds are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    #[default]
    FinishToStart,
}

/// A directed edge: `to_task` may not start before `from_task` finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: Uuid,
    pub from_task: Uuid,
    pub to_task: Uuid,
    #[serde(default)]
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn new(from_task: Uuid, to_task: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_task,
            to_task,
            kind: DependencyKind::FinishToStart,
        }
    }

    /// Whether the stored dates of `from` and `to` break this edge.
    pub fn is_violated_by(&self, from: &Task, to: &Task) -> bool {
        match self.kind {
            DependencyKind::FinishToStart => is_violated(from.end, to.start),
        }
    }
}

/// Finish-to-start check: the successor would begin before the
/// predecessor's finish day. Starting on the finish day itself is allowed.
///
/// Used both to flag broken connectors and to block drags.
pub fn is_violated(predecessor_end: NaiveDate, successor_start: NaiveDate) -> bool {
    successor_start < predecessor_end
}

/// Edges whose endpoints are both present in `rows`, in their original
/// order. Dangling edges (filtered or partially loaded plans) are dropped.
pub fn resolved_edges<'a, V>(
    deps: &'a [Dependency],
    rows: &HashMap<Uuid, V>,
) -> Vec<&'a Dependency> {
    deps.iter()
        .filter(|d| rows.contains_key(&d.from_task) && rows.contains_key(&d.to_task))
        .collect()
}

/// Group edges by their target, i.e. "what must finish before X starts".
pub fn incoming_edges_by_target<'a, I>(deps: I) -> HashMap<Uuid, Vec<&'a Dependency>>
where
    I: IntoIterator<Item = &'a Dependency>,
{
    let mut incoming: HashMap<Uuid, Vec<&'a Dependency>> = HashMap::new();
    for dep in deps {
        incoming.entry(dep.to_task).or_default().push(dep);
    }
    incoming
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn violation_is_strictly_before_finish_day() {
        assert!(is_violated(d(2024, 3, 10), d(2024, 3, 9)));
        assert!(!is_violated(d(2024, 3, 10), d(2024, 3, 10)));
        assert!(!is_violated(d(2024, 3, 10), d(2024, 3, 11)));
    }

    #[test]
    fn edge_uses_predecessor_end_and_successor_start() {
        let a = Task::new("pour slab", d(2024, 3, 1), d(2024, 3, 10));
        let mut b = Task::new("cure slab", d(2024, 3, 10), d(2024, 3, 20));
        let edge = Dependency::new(a.id, b.id);
        assert!(!edge.is_violated_by(&a, &b));

        b.start = d(2024, 3, 9);
        assert!(edge.is_violated_by(&a, &b));
    }

    #[test]
    fn resolved_edges_drop_dangling_and_keep_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ghost = Uuid::new_v4();
        let deps = vec![
            Dependency::new(b, c),
            Dependency::new(a, ghost),
            Dependency::new(a, b),
            Dependency::new(ghost, c),
        ];
        let rows: HashMap<Uuid, usize> = [(a, 0), (b, 1), (c, 2)].into_iter().collect();

        let resolved = resolved_edges(&deps, &rows);
        assert_eq!(resolved, vec![&deps[0], &deps[2]]);
    }

    #[test]
    fn incoming_edges_grouped_by_target() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let deps = vec![Dependency::new(a, c), Dependency::new(b, c), Dependency::new(a, b)];
        let incoming = incoming_edges_by_target(&deps);

        assert_eq!(incoming[&c].len(), 2);
        assert_eq!(incoming[&b], vec![&deps[2]]);
        assert!(!incoming.contains_key(&a));
    }

    #[test]
    fn kind_serializes_as_kebab_case() {
        let json = serde_json::to_string(&DependencyKind::FinishToStart).unwrap();
        assert_eq!(json, "\"finish-to-start\"");
    }
}
