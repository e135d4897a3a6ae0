use egui::{menu, RichText, Ui};

use crate::app::GanttApp;
use crate::model::ZoomLevel;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button("  File  ", |ui| {
            if ui.button("  New Plan").clicked() {
                app.new_project();
                ui.close_menu();
            }
            if ui.button("  Open...").clicked() {
                app.open_project();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Save          Ctrl+S").clicked() {
                app.save_project();
                ui.close_menu();
            }
            if ui.button("  Save As...").clicked() {
                app.save_project_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Import CSV...").clicked() {
                app.import_csv();
                ui.close_menu();
            }
            if ui.button("  Export CSV...").clicked() {
                app.export_csv();
                ui.close_menu();
            }
        });

        ui.menu_button("  View  ", |ui| {
            ui.label(RichText::new("Zoom").small().weak());
            let mut zoom = app.settings.zoom;
            for level in ZoomLevel::all() {
                if ui.radio_value(&mut zoom, *level, level.label()).clicked() {
                    ui.close_menu();
                }
            }
            if zoom != app.settings.zoom {
                app.set_zoom(zoom);
            }
            ui.separator();
            ui.label(RichText::new("Ctrl+Scroll over the chart also zooms").small().weak());
        });

        ui.menu_button("  Help  ", |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        ui.separator();
        for level in ZoomLevel::all() {
            if ui
                .selectable_label(app.settings.zoom == *level, level.label())
                .clicked()
            {
                app.set_zoom(*level);
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let dirty = if app.dirty { " •" } else { "" };
            ui.label(
                RichText::new(format!("{}{}", app.project.name, dirty))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
