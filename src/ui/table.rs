use eframe::egui::{self, Align, Layout, Stroke, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::ObservationColumn;
use crate::state::AppState;
use crate::theme::{Theme, BORDER_WIDTH, CELL_PADDING};

const HEADER_HEIGHT: f32 = 32.0;
/// Room for two wrapped lines plus padding.
const ROW_HEIGHT: f32 = 52.0;

// ---------------------------------------------------------------------------
// Observations table (central panel)
// ---------------------------------------------------------------------------

/// Render the title, the range headline and the filtered observations.
pub fn observations_view(ui: &mut Ui, state: &AppState, theme: &Theme, title: &str, height: f32) {
    ui.heading(theme.heading(title));
    ui.add_space(4.0);

    let Some(table) = state.table.as_ref().filter(|t| !t.is_empty()) else {
        ui.colored_label(egui::Color32::from_rgb(0xb4, 0x53, 0x09), "⚠ No data loaded.");
        return;
    };

    let today = chrono::Local::now().date_naive();
    ui.label(theme.heading(state.headline(today)).size(18.0));
    ui.add_space(8.0);

    let columns = &table.columns;
    let rows = &state.visible_indices;

    TableBuilder::new(ui)
        .striped(false)
        .resizable(true)
        .cell_layout(Layout::centered_and_justified(egui::Direction::TopDown))
        .columns(Column::remainder().at_least(90.0).clip(true), columns.len())
        .min_scrolled_height(0.0)
        .max_scroll_height(height)
        .header(HEADER_HEIGHT, |mut header| {
            for col in columns {
                header.col(|ui: &mut Ui| {
                    paint_cell(ui, theme.header, theme);
                    ui.label(theme.header_cell(col.label()));
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let record = &table.records[rows[row.index()]];
                for &col in columns {
                    row.col(|ui: &mut Ui| {
                        paint_cell(ui, theme.cell_bg, theme);
                        let text = record.cell_text(col);
                        egui::Frame::NONE
                            .inner_margin(CELL_PADDING)
                            .show(ui, |ui: &mut Ui| {
                                ui.with_layout(Layout::top_down(Align::Center), |ui: &mut Ui| {
                                    let label = ui.add(
                                        egui::Label::new(theme.body_cell(&text)).wrap(),
                                    );
                                    if col == ObservationColumn::ActivityComment {
                                        label.on_hover_text(text.as_str());
                                    }
                                });
                            });
                    });
                }
            });
        });
}

/// Fill the cell and draw its 1px border.
fn paint_cell(ui: &Ui, fill: egui::Color32, theme: &Theme) {
    let rect = ui.max_rect();
    let painter = ui.painter();
    painter.rect_filled(rect, 0.0, fill);
    painter.rect_stroke(
        rect,
        0.0,
        Stroke::new(BORDER_WIDTH, theme.border),
        egui::StrokeKind::Inside,
    );
}
