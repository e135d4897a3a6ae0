//! Pointer-driven drag/resize of task bars.
//!
//! The controller is a plain value owned by the chart widget: `Idle` or
//! `Dragging`. Holding a `Dragging` state is the lock, so a second drag
//! cannot start until the first ends. The controller never touches the
//! task tree; each accepted step yields a [`TaskPatch`] for the owner to
//! apply, and the next snapshot flows back in on the following frame.

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::date::{add_days, format_date};
use crate::model::dependency::{incoming_edges_by_target, is_violated, resolved_edges};
use crate::model::{flatten, Dependency, Forest, Task, TaskPatch, ZoomLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragMode {
    Move,
    ResizeStart,
    ResizeEnd,
}

impl DragMode {
    pub fn moves_start(&self) -> bool {
        matches!(self, DragMode::Move | DragMode::ResizeStart)
    }
}

/// Everything captured at pointer-down.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub task_id: Uuid,
    pub mode: DragMode,
    pub origin_x: f32,
    pub origin_scroll: f32,
    pub original_start: NaiveDate,
    pub original_end: NaiveDate,
    /// Dates as of the last emitted patch.
    pub applied_start: NaiveDate,
    pub applied_end: NaiveDate,
    /// Day delta of the last evaluated pointer position.
    pub last_delta: i64,
}

impl DragState {
    /// Dates for a delta, always derived from the original dates.
    fn tentative(&self, delta_days: i64) -> (NaiveDate, NaiveDate) {
        match self.mode {
            DragMode::Move => (
                add_days(self.original_start, delta_days),
                add_days(self.original_end, delta_days),
            ),
            DragMode::ResizeStart => (
                add_days(self.original_start, delta_days).min(self.original_end),
                self.original_end,
            ),
            DragMode::ResizeEnd => (
                self.original_start,
                add_days(self.original_end, delta_days).max(self.original_start),
            ),
        }
    }

    /// Only the fields this mode is allowed to change.
    fn patch(&self, start: NaiveDate, end: NaiveDate) -> TaskPatch {
        match self.mode {
            DragMode::Move => TaskPatch::dates(start, end),
            DragMode::ResizeStart => TaskPatch::start(start),
            DragMode::ResizeEnd => TaskPatch::end(end),
        }
    }
}

/// A predecessor that would still be running on the tentative start day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub task_name: String,
    pub predecessor_id: Uuid,
    pub predecessor_name: String,
    pub predecessor_end: NaiveDate,
    pub tentative_start: NaiveDate,
}

impl Violation {
    pub fn message(&self) -> String {
        format!(
            "'{}' cannot start before '{}' finishes ({})",
            self.task_name,
            self.predecessor_name,
            format_date(self.predecessor_end)
        )
    }
}

/// Incoming finish-to-start edges of the current snapshot.
pub struct Constraints<'a> {
    by_id: HashMap<Uuid, &'a Task>,
    incoming: HashMap<Uuid, Vec<&'a Dependency>>,
}

impl<'a> Constraints<'a> {
    pub fn new(tasks: &'a Forest, deps: &'a [Dependency]) -> Self {
        let mut by_id = HashMap::new();
        for flat in flatten(tasks) {
            by_id.entry(flat.task.id).or_insert(flat.task);
        }
        let incoming = incoming_edges_by_target(resolved_edges(deps, &by_id));
        Self { by_id, incoming }
    }

    /// First predecessor that `task_id` starting on `start` would overlap.
    pub fn check_start(&self, task_id: Uuid, start: NaiveDate) -> Result<(), Violation> {
        let Some(edges) = self.incoming.get(&task_id) else {
            return Ok(());
        };
        for edge in edges {
            let Some(pred) = self.by_id.get(&edge.from_task) else {
                continue;
            };
            if is_violated(pred.end, start) {
                return Err(Violation {
                    task_name: self
                        .by_id
                        .get(&task_id)
                        .map(|t| t.name.clone())
                        .unwrap_or_default(),
                    predecessor_id: pred.id,
                    predecessor_name: pred.name.clone(),
                    predecessor_end: pred.end,
                    tentative_start: start,
                });
            }
        }
        Ok(())
    }
}

/// Result of feeding one pointer position to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// No drag is active.
    Idle,
    /// Nothing new to emit for this position.
    Unchanged,
    Applied { task_id: Uuid, patch: TaskPatch },
    Rejected(Violation),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging(DragState),
}

impl Interaction {
    pub fn is_dragging(&self) -> bool {
        matches!(self, Interaction::Dragging(_))
    }

    pub fn state(&self) -> Option<&DragState> {
        match self {
            Interaction::Dragging(state) => Some(state),
            Interaction::Idle => None,
        }
    }

    pub fn active_task(&self) -> Option<Uuid> {
        self.state().map(|s| s.task_id)
    }

    /// Start dragging `task`. Returns `false` if a drag is already active.
    pub fn begin(&mut self, task: &Task, mode: DragMode, pointer_x: f32, scroll_x: f32) -> bool {
        if self.is_dragging() {
            return false;
        }
        *self = Interaction::Dragging(DragState {
            task_id: task.id,
            mode,
            origin_x: pointer_x,
            origin_scroll: scroll_x,
            original_start: task.start,
            original_end: task.end,
            applied_start: task.start,
            applied_end: task.end,
            last_delta: 0,
        });
        true
    }

    /// Feed a pointer position. `scroll_x` is the scroll container's
    /// current horizontal offset, so scrolling mid-drag does not jump.
    pub fn update(
        &mut self,
        pointer_x: f32,
        scroll_x: f32,
        zoom: ZoomLevel,
        constraints: &Constraints<'_>,
    ) -> DragOutcome {
        let Interaction::Dragging(state) = self else {
            return DragOutcome::Idle;
        };

        let delta_px = (pointer_x - state.origin_x) + (scroll_x - state.origin_scroll);
        let delta_days = (delta_px / zoom.pixels_per_day()).round() as i64;
        if delta_days == state.last_delta {
            return DragOutcome::Unchanged;
        }
        state.last_delta = delta_days;

        let (start, end) = state.tentative(delta_days);
        if (start, end) == (state.applied_start, state.applied_end) {
            return DragOutcome::Unchanged;
        }
        if state.mode.moves_start() {
            if let Err(violation) = constraints.check_start(state.task_id, start) {
                return DragOutcome::Rejected(violation);
            }
        }

        let patch = state.patch(start, end);
        state.applied_start = start;
        state.applied_end = end;
        DragOutcome::Applied {
            task_id: state.task_id,
            patch,
        }
    }

    /// Pointer released: every accepted step is already applied.
    pub fn end(&mut self) -> Option<DragState> {
        match std::mem::take(self) {
            Interaction::Dragging(state) => Some(state),
            Interaction::Idle => None,
        }
    }

    /// Abort the drag and return the patch that restores the original
    /// dates, if anything had changed.
    pub fn cancel(&mut self) -> Option<(Uuid, TaskPatch)> {
        let state = self.end()?;
        if (state.applied_start, state.applied_end) == (state.original_start, state.original_end) {
            return None;
        }
        Some((state.task_id, state.patch(state.original_start, state.original_end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::apply_change;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const ZOOM: ZoomLevel = ZoomLevel::Day;
    const PPD: f32 = 40.0;

    /// A (Mar 1 - Mar 10) -> B (Mar 10 - Mar 14).
    fn chain() -> (Forest, Vec<Dependency>, Task, Task) {
        let a = Task::new("excavate", d(2024, 3, 1), d(2024, 3, 10));
        let b = Task::new("footings", d(2024, 3, 10), d(2024, 3, 14));
        let deps = vec![Dependency::new(a.id, b.id)];
        (Forest::from(vec![a.clone(), b.clone()]), deps, a, b)
    }

    #[test]
    fn only_one_drag_at_a_time() {
        let (_, _, a, b) = chain();
        let mut ctl = Interaction::default();
        assert!(ctl.begin(&a, DragMode::Move, 0.0, 0.0));
        assert!(!ctl.begin(&b, DragMode::Move, 0.0, 0.0));
        assert_eq!(ctl.active_task(), Some(a.id));
        assert!(ctl.end().is_some());
        assert!(!ctl.is_dragging());
        assert!(ctl.begin(&b, DragMode::Move, 0.0, 0.0));
    }

    #[test]
    fn update_while_idle_is_a_no_op() {
        let (tasks, deps, ..) = chain();
        let constraints = Constraints::new(&tasks, &deps);
        let mut ctl = Interaction::default();
        assert_eq!(ctl.update(100.0, 0.0, ZOOM, &constraints), DragOutcome::Idle);
        assert_eq!(ctl.end(), None);
        assert_eq!(ctl.cancel(), None);
    }

    #[test]
    fn move_before_predecessor_finish_is_rejected() {
        let (tasks, deps, a, b) = chain();
        let constraints = Constraints::new(&tasks, &deps);
        let mut ctl = Interaction::default();
        ctl.begin(&b, DragMode::Move, 500.0, 0.0);

        match ctl.update(500.0 - PPD, 0.0, ZOOM, &constraints) {
            DragOutcome::Rejected(v) => {
                assert_eq!(v.predecessor_id, a.id);
                assert_eq!(v.predecessor_end, d(2024, 3, 10));
                assert_eq!(v.tentative_start, d(2024, 3, 9));
                assert!(v.message().contains("excavate"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        // Same delta again is debounced, not re-reported.
        assert_eq!(ctl.update(500.0 - PPD - 3.0, 0.0, ZOOM, &constraints), DragOutcome::Unchanged);
    }

    #[test]
    fn move_onto_or_after_finish_day_is_accepted() {
        let (tasks, deps, _, b) = chain();
        let constraints = Constraints::new(&tasks, &deps);
        let mut ctl = Interaction::default();
        ctl.begin(&b, DragMode::Move, 500.0, 0.0);

        // Back to the origin day: nothing to emit.
        assert_eq!(ctl.update(500.0 + 10.0, 0.0, ZOOM, &constraints), DragOutcome::Unchanged);

        let outcome = ctl.update(500.0 + 2.0 * PPD, 0.0, ZOOM, &constraints);
        assert_eq!(
            outcome,
            DragOutcome::Applied {
                task_id: b.id,
                patch: TaskPatch::dates(d(2024, 3, 12), d(2024, 3, 16)),
            }
        );
    }

    #[test]
    fn reversing_direction_reapplies_from_original() {
        let (tasks, _, a, _) = chain();
        let constraints = Constraints::new(&tasks, &[]);
        let mut ctl = Interaction::default();
        ctl.begin(&a, DragMode::Move, 0.0, 0.0);

        ctl.update(3.0 * PPD, 0.0, ZOOM, &constraints);
        let outcome = ctl.update(-1.0 * PPD, 0.0, ZOOM, &constraints);
        assert_eq!(
            outcome,
            DragOutcome::Applied {
                task_id: a.id,
                patch: TaskPatch::dates(d(2024, 2, 29), d(2024, 3, 9)),
            }
        );
    }

    #[test]
    fn resize_start_clamps_to_end() {
        let (tasks, _, a, _) = chain();
        let constraints = Constraints::new(&tasks, &[]);
        let mut ctl = Interaction::default();
        ctl.begin(&a, DragMode::ResizeStart, 0.0, 0.0);

        let outcome = ctl.update(30.0 * PPD, 0.0, ZOOM, &constraints);
        assert_eq!(
            outcome,
            DragOutcome::Applied {
                task_id: a.id,
                patch: TaskPatch::start(d(2024, 3, 10)),
            }
        );
        // Further right stays clamped and emits nothing new.
        assert_eq!(ctl.update(31.0 * PPD, 0.0, ZOOM, &constraints), DragOutcome::Unchanged);
    }

    #[test]
    fn resize_end_clamps_to_start_and_ignores_predecessors() {
        let (tasks, deps, _, b) = chain();
        let constraints = Constraints::new(&tasks, &deps);
        let mut ctl = Interaction::default();
        ctl.begin(&b, DragMode::ResizeEnd, 0.0, 0.0);

        let outcome = ctl.update(-20.0 * PPD, 0.0, ZOOM, &constraints);
        assert_eq!(
            outcome,
            DragOutcome::Applied {
                task_id: b.id,
                patch: TaskPatch::end(d(2024, 3, 10)),
            }
        );
    }

    #[test]
    fn resize_start_respects_predecessor() {
        let (tasks, deps, _, b) = chain();
        let constraints = Constraints::new(&tasks, &deps);
        let mut ctl = Interaction::default();
        ctl.begin(&b, DragMode::ResizeStart, 0.0, 0.0);

        assert!(matches!(
            ctl.update(-PPD, 0.0, ZOOM, &constraints),
            DragOutcome::Rejected(_)
        ));
        assert_eq!(
            ctl.update(PPD, 0.0, ZOOM, &constraints),
            DragOutcome::Applied {
                task_id: b.id,
                patch: TaskPatch::start(d(2024, 3, 11)),
            }
        );
    }

    #[test]
    fn scrolling_during_drag_counts_as_movement() {
        let (tasks, _, a, _) = chain();
        let constraints = Constraints::new(&tasks, &[]);
        let mut ctl = Interaction::default();
        ctl.begin(&a, DragMode::Move, 200.0, 100.0);

        // Pointer still, content scrolled two days to the right.
        let outcome = ctl.update(200.0, 100.0 + 2.0 * PPD, ZOOM, &constraints);
        assert_eq!(
            outcome,
            DragOutcome::Applied {
                task_id: a.id,
                patch: TaskPatch::dates(d(2024, 3, 3), d(2024, 3, 12)),
            }
        );
    }

    #[test]
    fn sub_day_jitter_is_debounced() {
        let (tasks, _, a, _) = chain();
        let constraints = Constraints::new(&tasks, &[]);
        let mut ctl = Interaction::default();
        ctl.begin(&a, DragMode::Move, 0.0, 0.0);

        assert!(matches!(ctl.update(PPD, 0.0, ZOOM, &constraints), DragOutcome::Applied { .. }));
        for jitter in [PPD + 5.0, PPD - 5.0, PPD + 19.0] {
            assert_eq!(ctl.update(jitter, 0.0, ZOOM, &constraints), DragOutcome::Unchanged);
        }
    }

    #[test]
    fn cancel_reverts_changed_fields_only() {
        let (tasks, _, a, _) = chain();
        let constraints = Constraints::new(&tasks, &[]);
        let mut ctl = Interaction::default();
        ctl.begin(&a, DragMode::ResizeEnd, 0.0, 0.0);
        ctl.update(4.0 * PPD, 0.0, ZOOM, &constraints);

        assert_eq!(ctl.cancel(), Some((a.id, TaskPatch::end(d(2024, 3, 10)))));
        assert!(!ctl.is_dragging());

        ctl.begin(&a, DragMode::Move, 0.0, 0.0);
        assert_eq!(ctl.cancel(), None);
    }

    #[test]
    fn accepted_patches_round_trip_through_snapshot() {
        let (tasks, deps, _, b) = chain();
        let mut ctl = Interaction::default();
        ctl.begin(&b, DragMode::Move, 0.0, 0.0);

        let mut snapshot = tasks.clone();
        for x in [PPD, 2.0 * PPD, -3.0 * PPD, 0.5 * PPD] {
            let constraints = Constraints::new(&snapshot, &deps);
            let outcome = ctl.update(x, 0.0, ZOOM, &constraints);
            if let DragOutcome::Applied { task_id, patch } = outcome {
                snapshot = apply_change(&snapshot, task_id, &patch);
            }
        }
        ctl.end();

        // -3 days was refused; 0.5 days rounds to 1.
        let moved = crate::model::find_by_id(&snapshot, b.id).unwrap();
        assert_eq!(moved.start, d(2024, 3, 11));
        assert_eq!(moved.end, d(2024, 3, 15));
        // The original snapshot is untouched.
        assert_eq!(crate::model::find_by_id(&tasks, b.id).unwrap().start, d(2024, 3, 10));
    }
}
