use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::{checked_add_days, day_diff};
use super::task::Forest;

/// Rendering density of the timeline. Never changes task dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoomLevel {
    Day,
    #[default]
    Week,
    Month,
}

impl ZoomLevel {
    pub fn all() -> &'static [ZoomLevel] {
        &[ZoomLevel::Day, ZoomLevel::Week, ZoomLevel::Month]
    }

    pub fn pixels_per_day(&self) -> f32 {
        match self {
            ZoomLevel::Day => 40.0,
            ZoomLevel::Week => 18.0,
            ZoomLevel::Month => 5.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ZoomLevel::Day => "Day",
            ZoomLevel::Week => "Week",
            ZoomLevel::Month => "Month",
        }
    }

    /// One step denser, saturating at `Day`.
    pub fn zoomed_in(self) -> ZoomLevel {
        match self {
            ZoomLevel::Month => ZoomLevel::Week,
            _ => ZoomLevel::Day,
        }
    }

    /// One step coarser, saturating at `Month`.
    pub fn zoomed_out(self) -> ZoomLevel {
        match self {
            ZoomLevel::Day => ZoomLevel::Week,
            _ => ZoomLevel::Month,
        }
    }
}

/// Breathing room added around the task dates, in days.
///
/// `around` treats negative values as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMargins {
    pub lead_days: i64,
    pub trail_days: i64,
}

impl WindowMargins {
    /// Largest margin accepted from a settings file, about ten years.
    pub const MAX_DAYS: i64 = 3650;

    pub fn clamped(self) -> Self {
        Self {
            lead_days: self.lead_days.clamp(0, Self::MAX_DAYS),
            trail_days: self.trail_days.clamp(0, Self::MAX_DAYS),
        }
    }
}

impl Default for WindowMargins {
    fn default() -> Self {
        Self {
            lead_days: 7,
            trail_days: 14,
        }
    }
}

/// The inclusive date range the chart spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimelineWindow {
    /// Cover every task plus margins. An empty plan centres on `today`.
    ///
    /// A margin that would leave the calendar is dropped on that side.
    pub fn around(tasks: &Forest, today: NaiveDate, margins: WindowMargins) -> Self {
        let (lo, hi) = tasks.date_bounds().unwrap_or((today, today));
        let lead = margins.lead_days.max(0);
        let trail = margins.trail_days.max(0);
        Self {
            start: checked_add_days(lo, -lead).unwrap_or(lo),
            end: checked_add_days(hi, trail).unwrap_or(hi),
        }
    }

    /// Number of calendar days in the window (always at least one).
    pub fn day_count(&self) -> i64 {
        (day_diff(self.start, self.end) + 1).max(1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// X offset of the left edge of `date`'s day column.
    pub fn date_to_x(&self, date: NaiveDate, zoom: ZoomLevel) -> f32 {
        day_diff(self.start, date) as f32 * zoom.pixels_per_day()
    }

    /// Total width in pixels of every day column in the window.
    pub fn total_width(&self, zoom: ZoomLevel) -> f32 {
        self.day_count() as f32 * zoom.pixels_per_day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn zoom_steps_saturate() {
        assert_eq!(ZoomLevel::Month.zoomed_in(), ZoomLevel::Week);
        assert_eq!(ZoomLevel::Day.zoomed_in(), ZoomLevel::Day);
        assert_eq!(ZoomLevel::Day.zoomed_out(), ZoomLevel::Week);
        assert_eq!(ZoomLevel::Month.zoomed_out(), ZoomLevel::Month);
    }

    #[test]
    fn window_wraps_tasks_with_margins() {
        let tasks = Forest::from(vec![
            Task::new("site prep", d(2024, 3, 4), d(2024, 3, 8)),
            Task::new("steel", d(2024, 3, 11), d(2024, 3, 29)),
        ]);
        let window = TimelineWindow::around(&tasks, d(2020, 1, 1), WindowMargins::default());
        assert_eq!(window.start, d(2024, 2, 26));
        assert_eq!(window.end, d(2024, 4, 12));
    }

    #[test]
    fn empty_plan_gets_positive_window_around_today() {
        let today = d(2024, 6, 1);
        let window = TimelineWindow::around(&Forest::default(), today, WindowMargins::default());
        assert!(window.contains(today));
        for zoom in ZoomLevel::all() {
            let width = window.total_width(*zoom);
            assert!(width.is_finite() && width > 0.0);
        }
    }

    #[test]
    fn zero_margins_still_have_one_day() {
        let today = d(2024, 6, 1);
        let margins = WindowMargins {
            lead_days: 0,
            trail_days: 0,
        };
        let window = TimelineWindow::around(&Forest::default(), today, margins);
        assert_eq!(window.day_count(), 1);
        assert_eq!(window.total_width(ZoomLevel::Day), 40.0);
    }

    #[test]
    fn oversized_margins_do_not_leave_the_calendar() {
        let today = d(2024, 6, 1);
        let margins = WindowMargins {
            lead_days: 200_000_000,
            trail_days: 14,
        };
        let window = TimelineWindow::around(&Forest::default(), today, margins);
        assert_eq!(window.start, today);
        assert_eq!(window.end, d(2024, 6, 15));
    }

    #[test]
    fn tasks_at_the_calendar_edge_keep_their_bounds() {
        let late = Task::new("far future", NaiveDate::MAX, NaiveDate::MAX);
        let early = Task::new("far past", NaiveDate::MIN, NaiveDate::MIN);
        let today = d(2024, 6, 1);
        let margins = WindowMargins::default();

        let window = TimelineWindow::around(&Forest::from(vec![late]), today, margins);
        assert_eq!(window.end, NaiveDate::MAX);
        assert_eq!(window.start, NaiveDate::MAX - chrono::Days::new(7));

        let window = TimelineWindow::around(&Forest::from(vec![early]), today, margins);
        assert_eq!(window.start, NaiveDate::MIN);
        assert!(window.day_count() > 1);
    }

    #[test]
    fn clamped_margins_stay_in_range() {
        let wild = WindowMargins {
            lead_days: -5,
            trail_days: i64::MAX,
        };
        assert_eq!(
            wild.clamped(),
            WindowMargins {
                lead_days: 0,
                trail_days: WindowMargins::MAX_DAYS,
            }
        );
        assert_eq!(WindowMargins::default().clamped(), WindowMargins::default());
    }

    #[test]
    fn date_x_mapping_follows_zoom() {
        let window = TimelineWindow {
            start: d(2024, 1, 1),
            end: d(2024, 1, 31),
        };
        assert_eq!(window.date_to_x(d(2024, 1, 3), ZoomLevel::Day), 80.0);
        assert_eq!(window.date_to_x(d(2024, 1, 3), ZoomLevel::Week), 36.0);
    }
}
