use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use crate::model::TaskStatus;

// ── Surfaces ─────────────────────────────────────────────────────────────────

pub const BG_CANVAS: Color32 = Color32::from_rgb(22, 24, 30);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 32, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(36, 39, 50);
pub const BG_ROW_ODD: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 5);
pub const BG_WEEKEND: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 40);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(70, 130, 210, 40);
/// Rows whose task starts before a predecessor finishes.
pub const BG_FLAGGED: Color32 = Color32::from_rgba_premultiplied(120, 30, 30, 60);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 53, 66);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(250, 190, 60);
pub const GRID_LINE: Color32 = Color32::from_rgb(42, 45, 56);
pub const MONTH_LINE: Color32 = Color32::from_rgb(70, 74, 90);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(228, 230, 238);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(150, 156, 174);
pub const TEXT_DIM: Color32 = Color32::from_rgb(98, 103, 118);
pub const TEXT_ON_BAR: Color32 = Color32::WHITE;

pub const ACCENT: Color32 = Color32::from_rgb(250, 176, 40);
pub const TODAY_LINE: Color32 = Color32::from_rgb(236, 72, 72);
pub const NEXT_START_LINE: Color32 = Color32::from_rgb(80, 190, 140);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 255, 255);

pub const CONNECTOR: Color32 = Color32::from_rgb(140, 148, 170);
pub const CONNECTOR_BROKEN: Color32 = Color32::from_rgb(236, 72, 72);
pub const ADVISORY_BG: Color32 = Color32::from_rgb(92, 40, 30);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const HEADER_HEIGHT: f32 = 44.0;
pub const HANDLE_WIDTH: f32 = 7.0;
pub const BAR_ROUNDING: f32 = 4.0;
pub const BAR_INSET: f32 = 5.0;
pub const INDENT_WIDTH: f32 = 14.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

/// Bar fill for a task status.
pub fn status_color(status: TaskStatus) -> Color32 {
    match status {
        TaskStatus::Planned => Color32::from_rgb(74, 128, 214),
        TaskStatus::InProgress => Color32::from_rgb(240, 150, 30),
        TaskStatus::Done => Color32::from_rgb(60, 160, 90),
        TaskStatus::Missing => Color32::from_rgb(150, 70, 180),
    }
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = BG_CANVAS;
    visuals.faint_bg_color = BG_ROW_ODD;

    let widgets = &mut visuals.widgets;
    for (w, fill, stroke) in [
        (&mut widgets.noninteractive, BG_PANEL, BORDER_SUBTLE),
        (&mut widgets.inactive, Color32::from_rgb(42, 45, 56), BORDER_SUBTLE),
        (&mut widgets.hovered, Color32::from_rgb(52, 55, 68), ACCENT),
        (&mut widgets.active, Color32::from_rgb(60, 63, 78), ACCENT),
        (&mut widgets.open, Color32::from_rgb(50, 53, 66), ACCENT),
    ] {
        w.bg_fill = fill;
        w.weak_bg_fill = fill;
        w.bg_stroke = Stroke::new(1.0, stroke);
        w.rounding = Rounding::same(4.0);
    }
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
