use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chart::Interaction;
use crate::config::Settings;
use crate::model::date::{add_days, format_date};
use crate::model::{find_by_id, Project, Task, TaskPatch, TaskStatus, ZoomLevel};
use crate::ui;
use crate::ui::advisory::{self, Advisory};
use crate::ui::dialogs::NewTaskForm;
use crate::ui::gantt_chart::{ChartInteraction, ChartView};
use crate::ui::task_table::TaskTableAction;

/// Main application state.
pub struct GanttApp {
    pub project: Project,
    pub settings: Settings,
    pub file_path: Option<PathBuf>,
    pub selected_task: Option<Uuid>,
    pub interaction: Interaction,
    /// Unsaved edits since the last open/save.
    pub dirty: bool,

    // Dialog state
    pub show_add_task: bool,
    pub show_about: bool,
    pub new_task: NewTaskForm,

    pub status_message: String,
    pub advisory: Option<Advisory>,
    window_title: String,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let settings = Settings::load();
        let today = Local::now().date_naive();
        let mut app = Self::with_project(Self::sample_project(today), settings);

        if let Some(path) = app.settings.last_file.clone() {
            if path.exists() {
                app.open_path(&path);
            }
        }
        app
    }

    /// Headless constructor; no window or settings file involved.
    pub fn with_project(project: Project, settings: Settings) -> Self {
        let today = Local::now().date_naive();
        Self {
            project,
            settings,
            file_path: None,
            selected_task: None,
            interaction: Interaction::default(),
            dirty: false,
            show_add_task: false,
            show_about: false,
            new_task: NewTaskForm::starting(today),
            status_message: "Ready".to_string(),
            advisory: None,
            window_title: String::new(),
        }
    }

    /// A small mid-rise build used as the first-run plan.
    pub fn sample_project(today: NaiveDate) -> Project {
        let day = |offset: i64| add_days(today, offset);
        let mut project = Project::new("Riverside Apartments");

        let mut survey = Task::new("Site survey", day(-20), day(-16));
        survey.status = TaskStatus::Done;
        survey.assignee = Some("Survey team".into());
        let mut excavation = Task::new("Excavation", day(-15), day(-6));
        excavation.status = TaskStatus::Done;
        let mut footings = Task::new("Footings", day(-5), day(3));
        footings.status = TaskStatus::InProgress;
        footings.assignee = Some("Acme Concrete".into());
        let groundworks_done = Task::new_milestone("Groundworks signed off", day(4));

        let mut frame = Task::new("Steel frame", day(5), day(25));
        frame.assignee = Some("Northern Steel".into());
        let slabs = Task::new("Floor slabs", day(12), day(32));
        let topping_out = Task::new_milestone("Topping out", day(33));

        let envelope = Task::new("Roof & cladding", day(34), day(55));
        let mut fit_out = Task::new("Interior fit-out", day(45), day(80));
        fit_out.assignee = Some("Interiors Ltd".into());
        let handover = Task::new_milestone("Handover", day(84));

        let (survey_id, excavation_id, footings_id) = (survey.id, excavation.id, footings.id);
        let (groundworks_id, frame_id, slabs_id) = (groundworks_done.id, frame.id, slabs.id);
        let (topping_id, envelope_id) = (topping_out.id, envelope.id);
        let (fit_out_id, handover_id) = (fit_out.id, handover.id);

        project.tasks = vec![
            Task::new("Groundworks", day(-20), day(4))
                .with_children(vec![survey, excavation, footings, groundworks_done]),
            Task::new("Structure", day(5), day(33)).with_children(vec![frame, slabs, topping_out]),
            Task::new("Envelope & finishes", day(34), day(84))
                .with_children(vec![envelope, fit_out, handover]),
        ]
        .into();

        for (from, to) in [
            (survey_id, excavation_id),
            (excavation_id, footings_id),
            (footings_id, groundworks_id),
            (groundworks_id, frame_id),
            (frame_id, topping_id),
            (slabs_id, topping_id),
            (topping_id, envelope_id),
            (envelope_id, handover_id),
            (fit_out_id, handover_id),
        ] {
            project.add_dependency(from, to);
        }
        project
    }

    // --- File operations ---

    pub fn new_project(&mut self) {
        self.project = Project::default();
        self.file_path = None;
        self.reset_view_state();
        self.status_message = "New plan created".to_string();
    }

    pub fn open_project(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Site plan", &["plan.json", "json"])
            .pick_file()
        {
            self.open_path(&path);
        }
    }

    pub fn open_path(&mut self, path: &Path) {
        match crate::io::load_project(path) {
            Ok(project) => {
                self.project = project;
                self.file_path = Some(path.to_path_buf());
                self.reset_view_state();
                self.remember_file(path);
                self.status_message = format!("Opened '{}'", self.project.name);
            }
            Err(e) => {
                warn!("failed to open {}: {}", path.display(), e);
                self.status_message = format!("Error loading: {}", e);
            }
        }
    }

    pub fn save_project(&mut self) {
        match self.file_path.clone() {
            Some(path) => self.write_to(&path),
            None => self.save_project_as(),
        }
    }

    pub fn save_project_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Site plan", &["plan.json", "json"])
            .set_file_name(format!("{}.plan.json", self.project.name))
            .save_file()
        {
            self.write_to(&path);
        }
    }

    fn write_to(&mut self, path: &Path) {
        self.project.touch();
        match crate::io::save_project(&self.project, path) {
            Ok(()) => {
                self.file_path = Some(path.to_path_buf());
                self.dirty = false;
                self.remember_file(path);
                self.status_message = "Plan saved".to_string();
            }
            Err(e) => {
                warn!("failed to save {}: {}", path.display(), e);
                self.status_message = format!("Error saving: {}", e);
            }
        }
    }

    pub fn import_csv(&mut self) {
        if !self.project.tasks.is_empty() {
            let confirm = rfd::MessageDialog::new()
                .set_title("Import CSV")
                .set_description("This will replace the current plan. Continue?")
                .set_buttons(rfd::MessageButtons::YesNo)
                .show();
            if confirm != rfd::MessageDialogResult::Yes {
                return;
            }
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "txt"])
            .pick_file()
        else {
            return;
        };

        match crate::io::import_csv(&path) {
            Ok((tasks, skipped)) => {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Imported Plan")
                    .to_string();
                self.project = Project::new(name);
                self.project.tasks = tasks;
                self.file_path = None;
                self.reset_view_state();
                self.dirty = true;

                let count = self.project.tasks.ids().len();
                self.status_message = if skipped > 0 {
                    format!("Imported {} tasks ({} rows skipped)", count, skipped)
                } else {
                    format!("Imported {} tasks", count)
                };
            }
            Err(e) => {
                warn!("CSV import from {} failed: {}", path.display(), e);
                self.status_message = format!("CSV import failed: {}", e);
            }
        }
    }

    pub fn export_csv(&mut self) {
        if self.project.tasks.is_empty() {
            self.status_message = "Nothing to export, the plan has no tasks".to_string();
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(format!("{}.csv", self.project.name))
            .save_file()
        {
            match crate::io::export_csv(&self.project.tasks, &path) {
                Ok(count) => self.status_message = format!("Exported {} tasks to CSV", count),
                Err(e) => {
                    warn!("CSV export to {} failed: {}", path.display(), e);
                    self.status_message = format!("CSV export failed: {}", e);
                }
            }
        }
    }

    fn remember_file(&mut self, path: &Path) {
        if self.settings.last_file.as_deref() == Some(path) {
            return;
        }
        self.settings.last_file = Some(path.to_path_buf());
        self.persist_settings();
    }

    fn persist_settings(&self) {
        if let Err(e) = self.settings.save() {
            warn!("could not save settings: {}", e);
        }
    }

    // --- View ---

    pub fn set_zoom(&mut self, zoom: ZoomLevel) {
        if self.settings.zoom == zoom {
            return;
        }
        // Pixel origins are zoom-specific, so an active drag cannot continue.
        if let Some((id, revert)) = self.interaction.cancel() {
            self.project.apply(id, &revert);
        }
        self.settings.zoom = zoom;
        self.persist_settings();
        self.status_message = format!("Zoom: {}", zoom.label());
    }

    fn reset_view_state(&mut self) {
        self.selected_task = None;
        self.interaction = Interaction::default();
        self.advisory = None;
        self.dirty = false;
    }

    // --- Task operations ---

    pub fn selected_task_name(&self) -> Option<String> {
        self.selected_task
            .and_then(|id| find_by_id(&self.project.tasks, id))
            .map(|t| t.name.clone())
    }

    pub fn create_task_from_dialog(&mut self) {
        let task = self.new_task.build();
        let id = task.id;
        let parent = self
            .selected_task
            .filter(|_| self.new_task.as_subtask)
            .filter(|p| find_by_id(&self.project.tasks, *p).is_some());

        self.project.tasks = match parent {
            Some(parent_id) => self.project.tasks.insert_child(parent_id, task),
            None => self.project.tasks.push_root(task),
        };
        self.project.touch();
        self.dirty = true;
        self.selected_task = Some(id);
        self.new_task = NewTaskForm::starting(Local::now().date_naive());
        self.status_message = "Task added".to_string();
    }

    pub fn delete_task(&mut self, id: Uuid) {
        if self.interaction.active_task() == Some(id) {
            self.interaction = Interaction::default();
        }
        let name = find_by_id(&self.project.tasks, id).map(|t| t.name.clone());
        if !self.project.remove_task(id) {
            return;
        }
        if let Some(sel) = self.selected_task {
            if find_by_id(&self.project.tasks, sel).is_none() {
                self.selected_task = None;
            }
        }
        self.dirty = true;
        self.status_message = format!("Deleted '{}'", name.unwrap_or_default());
    }

    pub fn link_to_selected(&mut self, predecessor: Uuid) {
        let Some(successor) = self.selected_task else {
            return;
        };
        if self.project.add_dependency(predecessor, successor) {
            self.dirty = true;
            self.status_message = "Dependency added".to_string();
        } else {
            self.status_message = "Those tasks are already linked".to_string();
        }
    }

    /// Apply one frame of chart output to the plan.
    pub fn handle_chart(&mut self, result: ChartInteraction, now: Instant) {
        let mut last: Option<(Uuid, TaskPatch)> = None;
        for (id, patch) in result.changes {
            if self.project.apply(id, &patch) {
                self.dirty = true;
                last = Some((id, patch));
            }
        }

        if let Some(message) = result.advisory {
            let ttl = Duration::from_secs(self.settings.advisory_seconds);
            advisory::post(&mut self.advisory, message, now, ttl);
        }

        if result.cancelled {
            self.status_message = "Drag cancelled".to_string();
        } else if let Some(id) = result.drag_finished.or(last.map(|(id, _)| id)) {
            if let Some(task) = find_by_id(&self.project.tasks, id) {
                self.status_message = format!(
                    "'{}' {} to {}",
                    task.name,
                    format_date(task.start),
                    format_date(task.end)
                );
                if result.drag_finished.is_some() {
                    info!("rescheduled '{}' to {}..{}", task.name, task.start, task.end);
                }
            }
        }

        if let Some(zoom) = result.zoom {
            self.set_zoom(zoom);
        }
    }

    pub fn handle_table(&mut self, action: TaskTableAction) {
        match action {
            TaskTableAction::Select(id) => self.selected_task = Some(id),
            TaskTableAction::Delete(id) => self.delete_task(id),
            TaskTableAction::Link(id) => self.link_to_selected(id),
            TaskTableAction::Add => self.show_add_task = true,
            TaskTableAction::None => {}
        }
    }

    fn title(&self) -> String {
        let dirty = if self.dirty { " *" } else { "" };
        format!("{}{} - Site Timeline", self.project.name, dirty)
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::S)) {
            self.save_project();
        }

        let title = self.title();
        if title != self.window_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.window_title = title;
        }

        // Snapshot for this frame; edits land in `self.project` afterwards.
        let tasks = self.project.tasks.clone();
        let dependencies = self.project.dependencies.clone();
        let view = ChartView::new(
            &tasks,
            &dependencies,
            self.settings.zoom,
            self.settings.margins,
            Local::now().date_naive(),
        );

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.0)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let broken = view.connectors.broken_count();
                        if broken > 0 {
                            ui.label(
                                egui::RichText::new(format!(
                                    "{} {} broken link{}",
                                    egui_phosphor::regular::WARNING,
                                    broken,
                                    if broken == 1 { "" } else { "s" }
                                ))
                                .size(10.5)
                                .color(ui::theme::CONNECTOR_BROKEN),
                            );
                            ui.label(
                                egui::RichText::new(" · ").size(10.5).color(ui::theme::TEXT_DIM),
                            );
                        }
                        ui.label(
                            egui::RichText::new(format!(
                                "Tasks: {}  ·  Links: {}  ·  Zoom: {}",
                                view.layout.rows.len(),
                                view.connectors.connectors.len(),
                                self.settings.zoom.label()
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        let mut table_action = TaskTableAction::None;
        egui::SidePanel::left("task_panel")
            .default_width(320.0)
            .min_width(220.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                table_action = ui::task_table::show_task_table(
                    view.tasks,
                    &view.connectors,
                    self.selected_task,
                    ui,
                );
            });
        self.handle_table(table_action);

        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_CANVAS)
            .inner_margin(egui::Margin::ZERO);
        let chart_result = egui::CentralPanel::default()
            .frame(chart_frame)
            .show(ctx, |ui| {
                ui::gantt_chart::show_gantt_chart(
                    &view,
                    &mut self.interaction,
                    &mut self.selected_task,
                    ui,
                )
            })
            .inner;
        self.handle_chart(chart_result, Instant::now());

        advisory::show(ctx, &mut self.advisory);

        if self.show_add_task {
            ui::dialogs::show_add_task_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Constraints, DragMode, DragOutcome};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn app() -> GanttApp {
        GanttApp::with_project(GanttApp::sample_project(d(2024, 6, 3)), Settings::default())
    }

    fn id_of(app: &GanttApp, name: &str) -> Uuid {
        crate::model::flatten(&app.project.tasks)
            .find(|f| f.task.name == name)
            .map(|f| f.task.id)
            .unwrap()
    }

    #[test]
    fn sample_plan_is_consistent() {
        let project = GanttApp::sample_project(d(2024, 6, 3));
        assert_eq!(project.tasks.len(), 3);
        assert_eq!(project.tasks.ids().len(), 13);
        assert!(project.tasks.duplicate_ids().is_empty());
        assert_eq!(project.dependencies.len(), 9);
        let by_id: std::collections::HashMap<_, _> = crate::model::flatten(&project.tasks)
            .map(|f| (f.task.id, f.task))
            .collect();
        for dep in &project.dependencies {
            assert!(!dep.is_violated_by(by_id[&dep.from_task], by_id[&dep.to_task]));
        }
    }

    #[test]
    fn chart_changes_are_applied_and_mark_dirty() {
        let mut app = app();
        let id = id_of(&app, "Floor slabs");
        let result = ChartInteraction {
            changes: vec![(id, TaskPatch::end(d(2024, 7, 10)))],
            ..Default::default()
        };
        app.handle_chart(result, Instant::now());

        assert!(app.dirty);
        assert_eq!(find_by_id(&app.project.tasks, id).unwrap().end, d(2024, 7, 10));
        assert!(app.status_message.contains("Floor slabs"));
    }

    #[test]
    fn rejected_step_posts_advisory() {
        let mut app = app();
        let frame = id_of(&app, "Steel frame");
        let task = find_by_id(&app.project.tasks, frame).unwrap().clone();

        assert!(app.interaction.begin(&task, DragMode::Move, 500.0, 0.0));
        let constraints = Constraints::new(&app.project.tasks, &app.project.dependencies);
        // Two days earlier lands on the groundworks sign-off.
        let outcome = app.interaction.update(420.0, 0.0, ZoomLevel::Day, &constraints);
        let DragOutcome::Rejected(violation) = outcome else {
            panic!("expected a rejection, got {:?}", outcome);
        };

        let now = Instant::now();
        app.handle_chart(
            ChartInteraction {
                advisory: Some(violation.message()),
                ..Default::default()
            },
            now,
        );
        let advisory = app.advisory.as_ref().unwrap();
        assert!(advisory.message.contains("Groundworks signed off"));
        assert!(advisory.is_expired(now + Duration::from_secs(app.settings.advisory_seconds)));
        assert!(!app.dirty);
    }

    #[test]
    fn new_task_goes_under_selection() {
        let mut app = app();
        let parent = id_of(&app, "Structure");
        app.selected_task = Some(parent);
        app.new_task.name = "Stair cores".into();
        app.create_task_from_dialog();

        let parent_task = find_by_id(&app.project.tasks, parent).unwrap();
        assert_eq!(parent_task.children.len(), 4);
        assert_eq!(app.selected_task_name().as_deref(), Some("Stair cores"));

        app.selected_task = None;
        app.new_task.name = "Snagging".into();
        app.create_task_from_dialog();
        assert_eq!(app.project.tasks.len(), 4);
    }

    #[test]
    fn deleting_a_phase_drops_its_links_and_selection() {
        let mut app = app();
        let phase = id_of(&app, "Groundworks");
        app.selected_task = Some(id_of(&app, "Footings"));
        app.delete_task(phase);

        assert!(app.selected_task.is_none());
        assert_eq!(app.project.tasks.ids().len(), 8);
        assert_eq!(app.project.dependencies.len(), 5);
    }

    #[test]
    fn link_requires_selection_and_is_not_duplicated() {
        let mut app = app();
        let survey = id_of(&app, "Site survey");
        let handover = id_of(&app, "Handover");
        app.link_to_selected(survey);
        assert!(!app.dirty);

        app.selected_task = Some(handover);
        app.link_to_selected(survey);
        app.link_to_selected(survey);
        assert_eq!(app.project.dependencies.len(), 10);
    }
}
