use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::DateRange;
use crate::data::model::ObservationColumn;
use crate::state::AppState;
use crate::theme::Theme;

/// Requests from the panels that need the app (source or file system).
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Refresh,
    OpenSnapshot(PathBuf),
    Export(PathBuf),
}

// ---------------------------------------------------------------------------
// Left side panel – date range and crop filter
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, theme: &Theme, logo: Option<&Path>) {
    if let Some(path) = logo {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add(
                egui::Image::new(format!("file://{}", path.display()))
                    .max_width(120.0)
                    .max_height(120.0),
            );
        });
        ui.add_space(4.0);
    }

    if !state.has_data() {
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            date_range_picker(ui, state, theme);
            ui.add_space(8.0);

            ui.heading(theme.heading("📊 Filters"));
            ui.separator();
            crop_filter(ui, state);
        });
}

fn date_range_picker(ui: &mut Ui, state: &mut AppState, theme: &Theme) {
    let Some(range) = state.filters.date_range else {
        return;
    };

    ui.label(theme.heading("View a date range:"));
    let mut start: NaiveDate = range.start;
    let mut end: NaiveDate = range.end;
    let mut changed = false;

    egui::Grid::new("date_range")
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("From");
            changed |= ui
                .add(DatePickerButton::new(&mut start).id_salt("range_start"))
                .changed();
            ui.end_row();

            ui.label("To");
            changed |= ui
                .add(DatePickerButton::new(&mut end).id_salt("range_end"))
                .changed();
            ui.end_row();
        });

    if let Some((min, max)) = state.date_bounds {
        ui.label(
            RichText::new(format!("Data spans {min} to {max}"))
                .small()
                .weak(),
        );
    }

    if changed {
        state.set_date_range(DateRange::new(start, end));
    }
}

fn crop_filter(ui: &mut Ui, state: &mut AppState) {
    let has_crop = state
        .table
        .as_ref()
        .is_some_and(|t| t.has_column(ObservationColumn::Crop));
    if !has_crop {
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let options = state.crop_options.clone();
    let header_text = format!(
        "Crop  ({}/{})",
        state.selected_crop_count(),
        options.len()
    );

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("crop_filter")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_crops();
                }
                if ui.small_button("None").clicked() {
                    state.select_none_crops();
                }
            });

            if options.is_empty() {
                ui.label(RichText::new("No crops in this range.").weak());
            }
            for crop in &options {
                let mut checked = state.is_crop_selected(crop);
                if ui.checkbox(&mut checked, crop.as_str()).changed() {
                    state.toggle_crop(crop);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &AppState) -> Option<PanelAction> {
    let mut action = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Data", |ui: &mut Ui| {
            if ui.button("Refresh").clicked() {
                action = Some(PanelAction::Refresh);
                ui.close_menu();
            }
            if ui.button("Open CSV snapshot…").clicked() {
                action = pick_snapshot().map(PanelAction::OpenSnapshot);
                ui.close_menu();
            }
            let can_export = state.has_data() && !state.visible_indices.is_empty();
            if ui
                .add_enabled(can_export, egui::Button::new("Export visible rows…"))
                .clicked()
            {
                action = pick_export_path().map(PanelAction::Export);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} observations loaded, {} visible",
                table.len(),
                state.visible_indices.len()
            ));
        }
        if let Some(source) = &state.source_label {
            ui.separator();
            ui.label(RichText::new(source).weak());
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    action
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_snapshot() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open custom report snapshot")
        .add_filter("CSV", &["csv"])
        .pick_file()
}

fn pick_export_path() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export visible observations")
        .set_file_name("observations.csv")
        .add_filter("CSV", &["csv"])
        .save_file()
}
