use std::collections::HashSet;

use egui::{pos2, Pos2};
use uuid::Uuid;

use super::layout::ChartLayout;
use crate::model::dependency::resolved_edges;
use crate::model::Dependency;

pub const MIN_CONTROL_OFFSET: f32 = 24.0;
pub const MAX_CONTROL_OFFSET: f32 = 120.0;

/// A cubic connector from a predecessor's end anchor to a successor's
/// start anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub dependency_id: Uuid,
    pub from_task: Uuid,
    pub to_task: Uuid,
    /// Start, first control, second control, end.
    pub points: [Pos2; 4],
    /// The successor currently starts before the predecessor finishes.
    pub broken: bool,
}

impl Connector {
    pub fn start(&self) -> Pos2 {
        self.points[0]
    }

    pub fn end(&self) -> Pos2 {
        self.points[3]
    }
}

/// Horizontal distance of each control point from its endpoint.
pub fn control_offset(dx: f32) -> f32 {
    (dx.abs() / 2.0).clamp(MIN_CONTROL_OFFSET, MAX_CONTROL_OFFSET)
}

/// S-curve between two points: leaves `from` heading right and enters
/// `to` heading right, even when `to` lies left of `from`.
pub fn curve(from: Pos2, to: Pos2) -> [Pos2; 4] {
    let offset = control_offset(to.x - from.x);
    [
        from,
        pos2(from.x + offset, from.y),
        pos2(to.x - offset, to.y),
        to,
    ]
}

/// All drawable connectors of a layout plus the rows to flag.
#[derive(Debug, Clone, Default)]
pub struct ConnectorSet {
    pub connectors: Vec<Connector>,
    /// Targets of at least one broken edge.
    pub flagged_rows: HashSet<Uuid>,
}

impl ConnectorSet {
    pub fn build(layout: &ChartLayout<'_>, deps: &[Dependency]) -> Self {
        let mut set = ConnectorSet::default();

        for dep in resolved_edges(deps, &layout.index) {
            let (Some(&from_idx), Some(&to_idx)) =
                (layout.index.get(&dep.from_task), layout.index.get(&dep.to_task))
            else {
                continue;
            };
            let (from_row, to_row) = (&layout.rows[from_idx], &layout.rows[to_idx]);
            let broken = dep.is_violated_by(layout.flat[from_idx].task, layout.flat[to_idx].task);

            if broken {
                set.flagged_rows.insert(dep.to_task);
            }
            set.connectors.push(Connector {
                dependency_id: dep.id,
                from_task: dep.from_task,
                to_task: dep.to_task,
                points: curve(
                    pos2(from_row.anchor_end, from_row.row_center),
                    pos2(to_row.anchor_start, to_row.row_center),
                ),
                broken,
            });
        }

        set
    }

    pub fn is_flagged(&self, task_id: Uuid) -> bool {
        self.flagged_rows.contains(&task_id)
    }

    pub fn broken_count(&self) -> usize {
        self.connectors.iter().filter(|c| c.broken).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Forest, Task, TimelineWindow, ZoomLevel};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window() -> TimelineWindow {
        TimelineWindow {
            start: d(2024, 3, 1),
            end: d(2024, 3, 31),
        }
    }

    #[test]
    fn control_offset_is_clamped() {
        assert_eq!(control_offset(10.0), MIN_CONTROL_OFFSET);
        assert_eq!(control_offset(-100.0), 50.0);
        assert_eq!(control_offset(1000.0), MAX_CONTROL_OFFSET);
    }

    #[test]
    fn curve_runs_between_anchors() {
        let [p0, c1, c2, p3] = curve(pos2(100.0, 16.0), pos2(300.0, 48.0));
        assert_eq!(p0, pos2(100.0, 16.0));
        assert_eq!(c1, pos2(200.0, 16.0));
        assert_eq!(c2, pos2(200.0, 48.0));
        assert_eq!(p3, pos2(300.0, 48.0));
    }

    #[test]
    fn connectors_link_end_to_start_and_flag_broken_targets() {
        let pour = Task::new("pour", d(2024, 3, 1), d(2024, 3, 10));
        let cure = Task::new("cure", d(2024, 3, 10), d(2024, 3, 15));
        let strip = Task::new("strip forms", d(2024, 3, 8), d(2024, 3, 9));
        let tasks = Forest::from(vec![pour.clone(), cure.clone(), strip.clone()]);
        let deps = vec![
            Dependency::new(pour.id, cure.id),
            Dependency::new(pour.id, strip.id),
            Dependency::new(cure.id, strip.id),
            Dependency::new(pour.id, uuid::Uuid::new_v4()),
        ];

        let layout = ChartLayout::compute(&tasks, ZoomLevel::Day, window());
        let set = ConnectorSet::build(&layout, &deps);

        assert_eq!(set.connectors.len(), 3);
        let first = &set.connectors[0];
        assert!(!first.broken);
        assert_eq!(first.start().x, layout.rows[0].anchor_end);
        assert_eq!(first.start().y, layout.rows[0].row_center);
        assert_eq!(first.end().x, layout.rows[1].anchor_start);
        assert_eq!(first.end().y, layout.rows[1].row_center);

        // Two broken edges into the same row flag it once.
        assert_eq!(set.broken_count(), 2);
        assert_eq!(set.flagged_rows.len(), 1);
        assert!(set.is_flagged(strip.id));
        assert!(!set.is_flagged(cure.id));
    }

    #[test]
    fn milestone_connectors_use_diamond_center() {
        let gate = Task::new_milestone("inspection", d(2024, 3, 5));
        let next = Task::new("close in", d(2024, 3, 6), d(2024, 3, 9));
        let tasks = Forest::from(vec![gate.clone(), next.clone()]);
        let deps = vec![Dependency::new(gate.id, next.id), Dependency::new(next.id, gate.id)];

        let layout = ChartLayout::compute(&tasks, ZoomLevel::Week, window());
        let set = ConnectorSet::build(&layout, &deps);
        let center = layout.rows[0].anchor_start;

        assert_eq!(set.connectors[0].start().x, center);
        assert_eq!(set.connectors[1].end().x, center);
        assert!(set.connectors[1].broken);
        assert!(set.is_flagged(gate.id));
    }

    #[test]
    fn short_hop_uses_minimum_control_offset() {
        let points = curve(pos2(0.0, 0.0), pos2(10.0, 32.0));
        assert_eq!(
            points,
            [pos2(0.0, 0.0), pos2(24.0, 0.0), pos2(-14.0, 32.0), pos2(10.0, 32.0)]
        );
    }
}
