use chrono::NaiveDate;
use egui::epaint::CubicBezierShape;
use egui::{
    Align2, Color32, CursorIcon, Id, Painter, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui, Vec2,
};
use tracing::debug;
use uuid::Uuid;

use crate::chart::{
    ChartLayout, Connector, ConnectorSet, Constraints, DayColumn, DragMode, DragOutcome,
    Interaction, RowInfo, ROW_HEIGHT,
};
use crate::model::date::format_date;
use crate::model::{Dependency, Forest, Task, TaskPatch, TimelineWindow, WindowMargins, ZoomLevel};
use crate::ui::theme;

const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// One frame's read-only view of the plan, shared by the chart and the
/// task table.
pub struct ChartView<'a> {
    pub tasks: &'a Forest,
    pub dependencies: &'a [Dependency],
    pub layout: ChartLayout<'a>,
    pub connectors: ConnectorSet,
    /// Day columns shared by the grid and the header.
    pub columns: Vec<DayColumn>,
    pub today: NaiveDate,
}

impl<'a> ChartView<'a> {
    pub fn new(
        tasks: &'a Forest,
        dependencies: &'a [Dependency],
        zoom: ZoomLevel,
        margins: WindowMargins,
        today: NaiveDate,
    ) -> Self {
        let window = TimelineWindow::around(tasks, today, margins);
        let layout = ChartLayout::compute(tasks, zoom, window);
        let connectors = ConnectorSet::build(&layout, dependencies);
        let columns = layout.day_columns();
        Self {
            tasks,
            dependencies,
            layout,
            connectors,
            columns,
            today,
        }
    }
}

/// What happened in the chart this frame. The chart never edits the
/// project itself; the caller applies `changes` in order.
#[derive(Debug, Default)]
pub struct ChartInteraction {
    pub changes: Vec<(Uuid, TaskPatch)>,
    pub advisory: Option<String>,
    /// Task whose drag ended on pointer release.
    pub drag_finished: Option<Uuid>,
    pub cancelled: bool,
    pub zoom: Option<ZoomLevel>,
}

/// Render the Gantt chart area (central panel).
pub fn show_gantt_chart(
    view: &ChartView<'_>,
    interaction: &mut Interaction,
    selected_task: &mut Option<Uuid>,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut out = ChartInteraction::default();
    let layout = &view.layout;
    let connectors = &view.connectors;
    let zoom = layout.zoom;

    if interaction.is_dragging() && ui.input(|i| i.key_pressed(egui::Key::Escape)) {
        if let Some(revert) = interaction.cancel() {
            out.changes.push(revert);
        }
        out.cancelled = true;
    }

    // Ctrl+scroll switches zoom level
    if ui.rect_contains_pointer(ui.max_rect()) && !interaction.is_dragging() {
        let zoom_delta = ui.input(|i| i.zoom_delta());
        let next = if zoom_delta > 1.0 {
            zoom.zoomed_in()
        } else if zoom_delta < 1.0 {
            zoom.zoomed_out()
        } else {
            zoom
        };
        if next != zoom {
            out.zoom = Some(next);
        }
    }

    let scroll_id = ui.make_persistent_id("gantt_scroll");
    let scroll_x = egui::scroll_area::State::load(ui.ctx(), scroll_id).map_or(0.0, |s| s.offset.x);

    let available = ui.available_size();
    let chart_width = layout.width().max(available.x);
    let chart_height = (HEADER_HEIGHT + layout.height() + 40.0).max(available.y);

    let scroll = egui::ScrollArea::both()
        .id_salt("gantt_scroll")
        .auto_shrink([false, false])
        .drag_to_scroll(false)
        .show(ui, |ui| {
            let (response, painter) =
                ui.allocate_painter(Vec2::new(chart_width, chart_height), Sense::click());
            let origin = response.rect.min;
            let rows_origin = origin + Vec2::new(0.0, HEADER_HEIGHT);
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_CANVAS);
            let bottom = response.rect.bottom();
            draw_day_grid(&painter, layout.zoom, &view.columns, rows_origin, bottom);
            draw_row_backgrounds(
                &painter,
                layout,
                connectors,
                *selected_task,
                rows_origin,
                chart_width,
            );
            draw_timeline_header(&painter, layout.zoom, &view.columns, origin, chart_width);

            if layout.rows.is_empty() {
                painter.text(
                    ui.clip_rect().center(),
                    Align2::CENTER_CENTER,
                    "No tasks yet. Add a task or import a CSV file to start planning.",
                    theme::font_header(),
                    theme::TEXT_DIM,
                );
            }

            for connector in &connectors.connectors {
                draw_connector(&painter, connector, rows_origin.to_vec2());
            }

            for (row, flat) in layout.rows.iter().zip(&layout.flat) {
                let task = flat.task;
                let is_selected = *selected_task == Some(task.id);
                let is_active = interaction.active_task() == Some(task.id);

                let shape_rect = if row.is_milestone {
                    draw_milestone(&painter, task, row, rows_origin, is_selected || is_active)
                } else {
                    draw_task_bar(&painter, task, row, rows_origin, is_selected || is_active)
                };

                let body = ui.interact(
                    shape_rect,
                    Id::new(("gantt-task", task.id, row.row_index)),
                    Sense::click_and_drag(),
                );
                let mut started = body.drag_started().then_some(DragMode::Move);
                let mut on_handle = false;

                if !row.is_milestone {
                    let (left_rect, right_rect) = handle_rects(shape_rect);
                    let left = ui.interact(
                        left_rect,
                        Id::new(("gantt-resize-start", task.id, row.row_index)),
                        Sense::drag(),
                    );
                    let right = ui.interact(
                        right_rect,
                        Id::new(("gantt-resize-end", task.id, row.row_index)),
                        Sense::drag(),
                    );
                    if left.drag_started() {
                        started = Some(DragMode::ResizeStart);
                    } else if right.drag_started() {
                        started = Some(DragMode::ResizeEnd);
                    }
                    on_handle = left.hovered() || right.hovered();
                    if is_selected || is_active || on_handle {
                        draw_handles(&painter, shape_rect);
                    }
                }

                if let Some(mode) = started {
                    let pointer_x = ui
                        .input(|i| i.pointer.press_origin())
                        .or(body.interact_pointer_pos())
                        .map_or(0.0, |p| p.x);
                    if interaction.begin(task, mode, pointer_x, scroll_x) {
                        debug!("drag {:?} started on '{}'", mode, task.name);
                        *selected_task = Some(task.id);
                        consumed_click = true;
                    }
                }

                if body.clicked() {
                    *selected_task = Some(task.id);
                    consumed_click = true;
                }

                if !interaction.is_dragging() {
                    if on_handle {
                        ui.ctx().set_cursor_icon(CursorIcon::ResizeHorizontal);
                    } else if body.hovered() {
                        ui.ctx().set_cursor_icon(CursorIcon::Grab);
                        egui::show_tooltip_at_pointer(
                            ui.ctx(),
                            ui.layer_id(),
                            Id::new(("gantt-tip", task.id, row.row_index)),
                            |ui| task_tooltip(ui, task),
                        );
                    }
                }
            }

            let markers = layout.markers(view.today);
            if let Some(x) = markers.next_start {
                let color = theme::NEXT_START_LINE;
                draw_marker(&painter, origin.x + x, origin.y, bottom, color, "Next");
            }
            if let Some(x) = markers.today {
                draw_marker(&painter, origin.x + x, origin.y, bottom, theme::TODAY_LINE, "Today");
            }

            // Empty click on background clears selection
            if response.clicked() && !consumed_click {
                *selected_task = None;
            }
        });

    if interaction.is_dragging() {
        let released = ui.input(|i| !i.pointer.primary_down());
        if let Some(pointer) = ui.ctx().pointer_latest_pos() {
            let constraints = Constraints::new(view.tasks, view.dependencies);
            match interaction.update(pointer.x, scroll.state.offset.x, zoom, &constraints) {
                DragOutcome::Applied { task_id, patch } => out.changes.push((task_id, patch)),
                DragOutcome::Rejected(violation) => {
                    debug!("drag step refused: {}", violation.message());
                    out.advisory = Some(violation.message());
                }
                DragOutcome::Idle | DragOutcome::Unchanged => {}
            }
        }
        if released {
            out.drag_finished = interaction.end().map(|state| state.task_id);
        } else {
            let icon = match interaction.state().map(|s| s.mode) {
                Some(DragMode::Move) => CursorIcon::Grabbing,
                _ => CursorIcon::ResizeHorizontal,
            };
            ui.ctx().set_cursor_icon(icon);
        }
    }

    out
}

fn task_tooltip(ui: &mut Ui, task: &Task) {
    ui.strong(&task.name);
    if task.is_milestone() {
        ui.label(format_date(task.start));
    } else {
        ui.label(format!(
            "{} {} {}  ({} days)",
            format_date(task.start),
            egui_phosphor::regular::ARROW_RIGHT,
            format_date(task.end),
            task.duration_days()
        ));
    }
    ui.label(format!("Status: {}", task.status.label()));
    if let Some(assignee) = &task.assignee {
        ui.label(format!("Assignee: {}", assignee));
    }
}

fn handle_rects(bar: Rect) -> (Rect, Rect) {
    let left = Rect::from_min_max(
        Pos2::new(bar.left() - HANDLE_WIDTH * 0.5, bar.top()),
        Pos2::new(bar.left() + HANDLE_WIDTH * 0.5, bar.bottom()),
    );
    let right = Rect::from_min_max(
        Pos2::new(bar.right() - HANDLE_WIDTH * 0.5, bar.top()),
        Pos2::new(bar.right() + HANDLE_WIDTH * 0.5, bar.bottom()),
    );
    (left.expand2(Vec2::new(3.0, 0.0)), right.expand2(Vec2::new(3.0, 0.0)))
}

fn draw_handles(painter: &Painter, bar: Rect) {
    let handle_h = bar.height() * 0.55;
    let handle_y = bar.center().y - handle_h / 2.0;
    for x in [bar.left() - 1.5, bar.right() - 2.5] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(x, handle_y), Vec2::new(4.0, handle_h)),
            Rounding::same(2.0),
            theme::HANDLE_COLOR,
        );
    }
}

fn draw_day_grid(
    painter: &Painter,
    zoom: ZoomLevel,
    columns: &[DayColumn],
    rows_origin: Pos2,
    bottom: f32,
) {
    let ruled = |has_label: bool, month_start: bool| match zoom {
        ZoomLevel::Day => true,
        ZoomLevel::Week => has_label || month_start,
        ZoomLevel::Month => month_start,
    };

    for col in columns {
        let x = rows_origin.x + col.x;
        if col.is_weekend && zoom != ZoomLevel::Month {
            painter.rect_filled(
                Rect::from_min_max(Pos2::new(x, rows_origin.y), Pos2::new(x + col.width, bottom)),
                0.0,
                theme::BG_WEEKEND,
            );
        }
        if ruled(col.label.is_some(), col.is_month_start) {
            let color = if col.is_month_start {
                theme::MONTH_LINE
            } else {
                theme::GRID_LINE
            };
            painter.line_segment(
                [Pos2::new(x, rows_origin.y), Pos2::new(x, bottom)],
                Stroke::new(0.5, color),
            );
        }
    }
}

fn draw_row_backgrounds(
    painter: &Painter,
    layout: &ChartLayout<'_>,
    connectors: &ConnectorSet,
    selected: Option<Uuid>,
    rows_origin: Pos2,
    width: f32,
) {
    for row in &layout.rows {
        let rect = Rect::from_min_size(
            Pos2::new(rows_origin.x, rows_origin.y + row.row_top),
            Vec2::new(width, ROW_HEIGHT),
        );
        if row.row_index % 2 == 1 {
            painter.rect_filled(rect, 0.0, theme::BG_ROW_ODD);
        }
        if connectors.is_flagged(row.task_id) {
            painter.rect_filled(rect, 0.0, theme::BG_FLAGGED);
        }
        if selected == Some(row.task_id) {
            painter.rect_filled(rect, 0.0, theme::BG_SELECTED);
        }
        painter.line_segment(
            [rect.left_bottom(), rect.right_bottom()],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }
}

fn draw_timeline_header(
    painter: &Painter,
    zoom: ZoomLevel,
    columns: &[DayColumn],
    origin: Pos2,
    width: f32,
) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for (i, col) in columns.iter().enumerate() {
        let x = origin.x + col.x;

        // Month names on the upper line; Month zoom already labels months.
        if zoom != ZoomLevel::Month && (col.is_month_start || i == 0) {
            painter.text(
                Pos2::new(x + 3.0, origin.y + 12.0),
                Align2::LEFT_CENTER,
                col.date.format("%B %Y").to_string(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }

        if let Some(label) = &col.label {
            painter.line_segment(
                [
                    Pos2::new(x, origin.y + HEADER_HEIGHT - 8.0),
                    Pos2::new(x, origin.y + HEADER_HEIGHT),
                ],
                Stroke::new(1.0, theme::GRID_LINE),
            );
            let color = if col.is_weekend {
                theme::TEXT_DIM
            } else {
                theme::TEXT_SECONDARY
            };
            painter.text(
                Pos2::new(x + 3.0, origin.y + 28.0),
                Align2::LEFT_CENTER,
                label,
                theme::font_sub(),
                color,
            );
        }
    }
}

fn draw_connector(painter: &Painter, connector: &Connector, offset: Vec2) {
    let points = connector.points.map(|p| p + offset);
    let color = if connector.broken {
        theme::CONNECTOR_BROKEN
    } else {
        theme::CONNECTOR
    };
    let stroke = Stroke::new(1.5, color);
    let curve = CubicBezierShape::from_points_stroke(points, false, Color32::TRANSPARENT, stroke);

    if connector.broken {
        let path = curve.flatten(Some(0.5));
        painter.extend(Shape::dashed_line(&path, stroke, 5.0, 3.0));
    } else {
        painter.add(curve);
    }

    let tip = points[3];
    painter.add(Shape::convex_polygon(
        vec![tip, tip + Vec2::new(-6.0, -3.5), tip + Vec2::new(-6.0, 3.5)],
        color,
        Stroke::NONE,
    ));
}

fn draw_marker(painter: &Painter, x: f32, top: f32, bottom: f32, color: Color32, label: &str) {
    painter.line_segment(
        [Pos2::new(x, top + HEADER_HEIGHT), Pos2::new(x, bottom)],
        Stroke::new(1.5, color),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, top + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), color);
    painter.text(
        badge_rect.center(),
        Align2::CENTER_CENTER,
        label,
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_task_bar(
    painter: &Painter,
    task: &Task,
    row: &RowInfo,
    rows_origin: Pos2,
    highlighted: bool,
) -> Rect {
    let inset = theme::BAR_INSET;
    let bar_rect = Rect::from_min_size(
        Pos2::new(rows_origin.x + row.shape_left(), rows_origin.y + row.row_top + inset),
        Vec2::new(row.bar_width, ROW_HEIGHT - inset * 2.0),
    );
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    painter.rect_filled(
        bar_rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(bar_rect, rounding, theme::status_color(task.status));
    painter.rect_filled(
        Rect::from_min_size(
            bar_rect.min,
            Vec2::new(bar_rect.width(), (bar_rect.height() * 0.45).max(4.0)),
        ),
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    if highlighted {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if bar_rect.width() > 30.0 {
        let galley =
            painter.layout_no_wrap(task.name.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        painter.with_clip_rect(bar_rect).galley(
            Pos2::new(bar_rect.left() + 6.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    } else {
        painter.text(
            Pos2::new(bar_rect.right() + 6.0, bar_rect.center().y),
            Align2::LEFT_CENTER,
            &task.name,
            theme::font_bar(),
            theme::TEXT_SECONDARY,
        );
    }

    bar_rect
}

fn draw_milestone(
    painter: &Painter,
    task: &Task,
    row: &RowInfo,
    rows_origin: Pos2,
    highlighted: bool,
) -> Rect {
    let center = Pos2::new(rows_origin.x + row.anchor_start, rows_origin.y + row.row_center);
    let half = row.bar_width / 2.0;
    let diamond = |c: Pos2| {
        vec![
            Pos2::new(c.x, c.y - half),
            Pos2::new(c.x + half, c.y),
            Pos2::new(c.x, c.y + half),
            Pos2::new(c.x - half, c.y),
        ]
    };

    painter.add(Shape::convex_polygon(
        diamond(center + Vec2::new(1.0, 1.5)),
        Color32::from_black_alpha(40),
        Stroke::NONE,
    ));
    let stroke = if highlighted {
        Stroke::new(2.0, theme::BORDER_ACCENT)
    } else {
        Stroke::NONE
    };
    painter.add(Shape::convex_polygon(
        diamond(center),
        theme::status_color(task.status),
        stroke,
    ));

    painter.text(
        Pos2::new(center.x + half + 6.0, center.y),
        Align2::LEFT_CENTER,
        &task.name,
        theme::font_bar(),
        theme::TEXT_SECONDARY,
    );

    Rect::from_center_size(center, Vec2::splat(row.bar_width + 4.0))
}
