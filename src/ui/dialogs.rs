use chrono::NaiveDate;
use egui::{Color32, Context, RichText, Window};

use crate::app::GanttApp;
use crate::model::date::add_days;
use crate::model::{Task, TaskStatus};
use crate::ui::theme;

/// Fields of the "Add Task" dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskForm {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub milestone: bool,
    pub status: TaskStatus,
    pub assignee: String,
    /// Nest under the selected task instead of adding a top-level task.
    pub as_subtask: bool,
}

impl NewTaskForm {
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            start: today,
            end: add_days(today, 6),
            milestone: false,
            status: TaskStatus::Planned,
            assignee: String::new(),
            as_subtask: true,
        }
    }

    pub fn build(&self) -> Task {
        let name = match self.name.trim() {
            "" => "New Task",
            name => name,
        };
        let mut task = if self.milestone {
            Task::new_milestone(name, self.start)
        } else {
            Task::new(name, self.start, self.end)
        };
        task.status = self.status;
        task.assignee = Some(self.assignee.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        task
    }
}

/// Render the "Add Task" dialog.
pub fn show_add_task_dialog(app: &mut GanttApp, ctx: &Context) {
    let mut should_close = false;
    let parent_name = app.selected_task_name();

    Window::new(RichText::new("Add Task").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([340.0, 0.0])
        .show(ctx, |ui| {
            let form = &mut app.new_task;
            ui.add_space(4.0);

            egui::Grid::new("add_task_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Name").color(theme::TEXT_SECONDARY));
                    ui.add_sized(
                        [220.0, 24.0],
                        egui::TextEdit::singleline(&mut form.name)
                            .hint_text("e.g. Pour ground slab"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Start").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui_extras::DatePickerButton::new(&mut form.start).id_salt("dlg_dp_start"),
                    );
                    ui.end_row();

                    if !form.milestone {
                        ui.label(RichText::new("End").color(theme::TEXT_SECONDARY));
                        ui.add(
                            egui_extras::DatePickerButton::new(&mut form.end).id_salt("dlg_dp_end"),
                        );
                        ui.end_row();
                    }

                    ui.label(RichText::new("Status").color(theme::TEXT_SECONDARY));
                    egui::ComboBox::from_id_salt("dlg_status")
                        .selected_text(form.status.label())
                        .show_ui(ui, |ui| {
                            for status in TaskStatus::all() {
                                ui.selectable_value(&mut form.status, *status, status.label());
                            }
                        });
                    ui.end_row();

                    ui.label(RichText::new("Assignee").color(theme::TEXT_SECONDARY));
                    ui.add_sized(
                        [220.0, 24.0],
                        egui::TextEdit::singleline(&mut form.assignee)
                            .hint_text("Crew or contractor"),
                    );
                    ui.end_row();

                    ui.label("");
                    ui.checkbox(&mut form.milestone, "Milestone");
                    ui.end_row();

                    if let Some(parent) = &parent_name {
                        ui.label("");
                        ui.checkbox(&mut form.as_subtask, format!("Subtask of '{}'", parent));
                        ui.end_row();
                    }
                });

            if !form.milestone && form.end < form.start {
                ui.label(
                    RichText::new("End is before start; it will be moved to the start day.")
                        .small()
                        .color(theme::TEXT_DIM),
                );
            }

            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let create_btn = egui::Button::new(RichText::new("Create").color(Color32::BLACK))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_sized([80.0, 28.0], create_btn).clicked() {
                    app.create_task_from_dialog();
                    should_close = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    should_close = true;
                }
            });
            ui.add_space(2.0);
        });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_add_task = false;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut GanttApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 200.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Site Timeline").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Drag bars to reschedule, drag their edges to resize.");
                ui.label("Esc cancels a drag in progress.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}
