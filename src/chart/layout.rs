//! Pixel geometry for the timeline.
//!
//! Everything is measured from the left edge of the window's first day
//! column and the top of the first row; the widget adds its own origin.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use uuid::Uuid;

use crate::model::date::{add_days, day_diff};
use crate::model::{flatten, FlatTask, Forest, TimelineWindow, ZoomLevel};

pub const ROW_HEIGHT: f32 = 32.0;
/// Space left between consecutive day-aligned bars.
pub const BAR_GUTTER: f32 = 2.0;

/// Side length of a milestone diamond's bounding box.
pub fn milestone_size(zoom: ZoomLevel) -> f32 {
    (zoom.pixels_per_day() * 0.6).clamp(10.0, 20.0)
}

/// Geometry of one task row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowInfo {
    pub task_id: Uuid,
    pub row_index: usize,
    pub depth: usize,
    pub is_milestone: bool,
    /// Offset of the start day's column, never negative.
    pub left: f32,
    /// Bar width, or the diamond's box size for milestones.
    pub bar_width: f32,
    pub anchor_start: f32,
    pub anchor_end: f32,
    pub row_top: f32,
    pub row_center: f32,
}

impl RowInfo {
    /// Left edge of the drawn shape.
    pub fn shape_left(&self) -> f32 {
        if self.is_milestone {
            self.anchor_start - self.bar_width / 2.0
        } else {
            self.left
        }
    }
}

/// One calendar day of the background grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub x: f32,
    pub width: f32,
    pub label: Option<String>,
    pub is_weekend: bool,
    pub is_month_start: bool,
}

/// Vertical guide lines, present only when their date is in the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Markers {
    pub today: Option<f32>,
    pub next_start: Option<f32>,
}

/// Row geometry for a flattened task tree at a given zoom and window.
#[derive(Debug, Clone)]
pub struct ChartLayout<'a> {
    pub zoom: ZoomLevel,
    pub window: TimelineWindow,
    pub flat: Vec<FlatTask<'a>>,
    pub rows: Vec<RowInfo>,
    /// Task id to row index.
    pub index: HashMap<Uuid, usize>,
}

impl<'a> ChartLayout<'a> {
    pub fn compute(tasks: &'a Forest, zoom: ZoomLevel, window: TimelineWindow) -> Self {
        let flat: Vec<FlatTask<'a>> = flatten(tasks).collect();
        let ppd = zoom.pixels_per_day();

        let rows: Vec<RowInfo> = flat
            .iter()
            .enumerate()
            .map(|(row_index, ft)| {
                let task = ft.task;
                let left = (day_diff(window.start, task.start) as f32 * ppd).max(0.0);
                let row_top = row_index as f32 * ROW_HEIGHT;
                let is_milestone = task.is_milestone();

                let (bar_width, anchor_start, anchor_end) = if is_milestone {
                    let center = left + ppd / 2.0;
                    (milestone_size(zoom), center, center)
                } else {
                    let width = (task.duration_days() as f32 * ppd - BAR_GUTTER).max(1.0);
                    (width, left, left + width)
                };

                RowInfo {
                    task_id: task.id,
                    row_index,
                    depth: ft.depth,
                    is_milestone,
                    left,
                    bar_width,
                    anchor_start,
                    anchor_end,
                    row_top,
                    row_center: row_top + ROW_HEIGHT / 2.0,
                }
            })
            .collect();

        let mut index = HashMap::with_capacity(rows.len());
        for row in &rows {
            // Keep the first occurrence when ids repeat.
            index.entry(row.task_id).or_insert(row.row_index);
        }

        Self {
            zoom,
            window,
            flat,
            rows,
            index,
        }
    }

    pub fn pixels_per_day(&self) -> f32 {
        self.zoom.pixels_per_day()
    }

    pub fn width(&self) -> f32 {
        self.window.total_width(self.zoom)
    }

    pub fn height(&self) -> f32 {
        self.rows.len() as f32 * ROW_HEIGHT
    }

    pub fn row(&self, id: Uuid) -> Option<&RowInfo> {
        self.index.get(&id).and_then(|&i| self.rows.get(i))
    }

    /// One column per day in the window, labelled according to the zoom.
    pub fn day_columns(&self) -> Vec<DayColumn> {
        let ppd = self.pixels_per_day();
        (0..self.window.day_count())
            .map(|offset| {
                let date = add_days(self.window.start, offset);
                let label = match self.zoom {
                    ZoomLevel::Day => Some(date.format("%d").to_string()),
                    ZoomLevel::Week if date.weekday() == Weekday::Mon => {
                        Some(date.format("%d %b").to_string())
                    }
                    ZoomLevel::Month if date.day() == 1 => Some(date.format("%b %Y").to_string()),
                    _ => None,
                };
                DayColumn {
                    date,
                    x: offset as f32 * ppd,
                    width: ppd,
                    label,
                    is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
                    is_month_start: date.day() == 1,
                }
            })
            .collect()
    }

    /// Today's line and the start of the next task that begins after today.
    pub fn markers(&self, today: NaiveDate) -> Markers {
        let x_of = |date: NaiveDate| {
            self.window
                .contains(date)
                .then(|| self.window.date_to_x(date, self.zoom))
        };
        let next_start = self
            .flat
            .iter()
            .map(|ft| ft.task.start)
            .filter(|start| *start > today)
            .min();
        Markers {
            today: x_of(today),
            next_start: next_start.and_then(x_of),
        }
    }
}
