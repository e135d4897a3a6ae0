use egui::{Color32, RichText, Ui};
use uuid::Uuid;

use crate::chart::ConnectorSet;
use crate::model::{flatten, Forest};
use crate::ui::theme;

/// Actions that the task table can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTableAction {
    None,
    Select(Uuid),
    Delete(Uuid),
    /// Make the given task a predecessor of the selected one.
    Link(Uuid),
    Add,
}

/// Render the left-side task list: one row per task in display order,
/// children indented under their parent.
pub fn show_task_table(
    tasks: &Forest,
    connectors: &ConnectorSet,
    selected_task: Option<Uuid>,
    ui: &mut Ui,
) -> TaskTableAction {
    let mut action = TaskTableAction::None;
    let total = flatten(tasks).count();

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(RichText::new("Tasks").strong().size(15.0).color(theme::TEXT_PRIMARY));
        ui.add_space(4.0);
        ui.label(RichText::new(format!("({})", total)).size(11.0).color(theme::TEXT_DIM));
    });
    ui.add_space(4.0);

    let add_label = match selected_task {
        Some(_) => format!("{}  Add Subtask", egui_phosphor::regular::PLUS),
        None => format!("{}  Add Task", egui_phosphor::regular::PLUS),
    };
    let btn = egui::Button::new(RichText::new(add_label).color(Color32::BLACK).size(12.0))
        .fill(theme::ACCENT)
        .rounding(egui::Rounding::same(5.0));
    if ui.add_sized([ui.available_width(), 30.0], btn).clicked() {
        action = TaskTableAction::Add;
    }

    ui.add_space(6.0);
    ui.separator();

    egui::ScrollArea::vertical()
        .id_salt("task_table_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (i, flat) in flatten(tasks).enumerate() {
                let task = flat.task;
                let is_selected = selected_task == Some(task.id);
                let flagged = connectors.is_flagged(task.id);

                let row_bg = if is_selected {
                    theme::BG_SELECTED
                } else if flagged {
                    theme::BG_FLAGGED
                } else if i % 2 == 1 {
                    theme::BG_ROW_ODD
                } else {
                    Color32::TRANSPARENT
                };

                let frame = egui::Frame::none()
                    .fill(row_bg)
                    .rounding(egui::Rounding::same(4.0))
                    .inner_margin(egui::Margin::symmetric(6.0, 4.0));

                frame.show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 6.0;
                        ui.add_space(flat.depth as f32 * theme::INDENT_WIDTH);

                        let (dot_rect, _) =
                            ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                        ui.painter().circle_filled(
                            dot_rect.center(),
                            4.0,
                            theme::status_color(task.status),
                        );

                        let name = if task.is_milestone() {
                            format!("{} {}", egui_phosphor::regular::DIAMOND, task.name)
                        } else {
                            task.name.clone()
                        };
                        let color = if is_selected {
                            Color32::WHITE
                        } else {
                            theme::TEXT_PRIMARY
                        };
                        let mut name_text = RichText::new(name).size(12.0).color(color);
                        if !task.children.is_empty() {
                            name_text = name_text.strong();
                        }
                        // Leave room for the dates and the delete button.
                        let name_width = (ui.available_width() - 120.0).max(40.0);
                        let label = ui
                            .allocate_ui(egui::vec2(name_width, 18.0), |ui| {
                                ui.add(
                                    egui::Label::new(name_text)
                                        .truncate()
                                        .sense(egui::Sense::click()),
                                )
                            })
                            .inner;
                        if label.clicked() {
                            action = TaskTableAction::Select(task.id);
                        }

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.spacing_mut().item_spacing.x = 4.0;

                            let delete = ui.add(
                                egui::Button::new(
                                    RichText::new(egui_phosphor::regular::X)
                                        .size(10.0)
                                        .color(theme::TEXT_DIM),
                                )
                                .frame(false),
                            );
                            if delete.on_hover_text("Delete task and its subtasks").clicked() {
                                action = TaskTableAction::Delete(task.id);
                            }

                            if selected_task.is_some_and(|sel| sel != task.id) {
                                let link = ui.add(
                                    egui::Button::new(
                                        RichText::new(egui_phosphor::regular::LINK)
                                            .size(10.0)
                                            .color(theme::TEXT_DIM),
                                    )
                                    .frame(false),
                                );
                                if link
                                    .on_hover_text("Must finish before the selected task starts")
                                    .clicked()
                                {
                                    action = TaskTableAction::Link(task.id);
                                }
                            }

                            let dates = if task.is_milestone() {
                                task.start.format("%d %b").to_string()
                            } else {
                                format!(
                                    "{} – {}",
                                    task.start.format("%d %b"),
                                    task.end.format("%d %b")
                                )
                            };
                            ui.label(RichText::new(dates).size(10.0).color(theme::TEXT_SECONDARY));
                        });
                    });
                });

                ui.add_space(1.0);
            }
        });

    action
}
