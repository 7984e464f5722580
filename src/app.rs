use std::time::Instant;

use eframe::egui;

use crate::config::Config;
use crate::data::export::export_file;
use crate::data::loader;
use crate::data::source::{CsvSource, RecordSource};
use crate::state::AppState;
use crate::theme::Theme;
use crate::ui::panels::{self, PanelAction};
use crate::ui::table;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
    config: Config,
    theme: Theme,
    source: Box<dyn RecordSource>,
}

impl DashboardApp {
    /// Build the app and run the first load.
    pub fn new(config: Config, theme: Theme, source: Box<dyn RecordSource>) -> Self {
        let mut app = Self {
            state: AppState::default(),
            config,
            theme,
            source,
        };
        app.reload();
        app
    }

    /// Query the source again, replacing the cached table.
    pub fn reload(&mut self) {
        let today = chrono::Local::now().date_naive();
        match loader::load(self.source.as_ref()) {
            Ok(table) => self.state.set_table(table, self.source.describe(), today),
            Err(e) => {
                log::error!("Loading observations failed: {e:#}");
                self.state.set_load_error(&e);
            }
        }
    }

    fn handle(&mut self, action: PanelAction) {
        match action {
            PanelAction::Refresh => self.reload(),
            PanelAction::OpenSnapshot(path) => {
                log::info!("Switching source to snapshot {}", path.display());
                self.source = Box::new(CsvSource::new(path));
                self.state = AppState::default();
                self.reload();
            }
            PanelAction::Export(path) => {
                let Some(table) = &self.state.table else {
                    return;
                };
                if let Err(e) = export_file(table, &self.state.visible_indices, &path) {
                    log::error!("Export failed: {e:#}");
                    self.state.status_message = Some(format!("Export failed: {e:#}"));
                }
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let ttl = self.config.cache_ttl();
        if self.state.needs_reload(Instant::now(), ttl) {
            log::info!("Cached observations expired, reloading");
            self.reload();
        }
        if let Some(ttl) = ttl {
            ctx.request_repaint_after(ttl);
        }

        // ---- Top panel: menu bar ----
        let action = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| panels::top_bar(ui, &self.state))
            .inner;

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .frame(self.theme.sidebar_frame(&ctx.style()))
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(
                    ui,
                    &mut self.state,
                    &self.theme,
                    self.config.display.logo.as_deref(),
                );
            });

        // ---- Central panel: observations ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::observations_view(
                ui,
                &self.state,
                &self.theme,
                &self.config.display.title,
                self.config.display.table_height,
            );
        });

        if let Some(action) = action {
            self.handle(action);
        }
    }
}
