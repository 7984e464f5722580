mod app;
mod config;
mod data;
mod state;
mod theme;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::DashboardApp;
use config::Config;
use data::source::source_from_config;
use eframe::egui;
use theme::Theme;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = Config::resolve_path(std::env::args_os().nth(1).map(PathBuf::from));
    let config = Config::load(&config_path).context("loading configuration")?;
    let theme = Theme::from_config(&config.theme).unwrap_or_else(|e| {
        log::error!("{e}; using the built-in theme");
        Theme::default()
    });
    let source = source_from_config(&config);
    log::info!("Reading observations from {}", source.describe());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([700.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Agworld Custom Report",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render the sidebar logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            theme.apply(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(config, theme, source)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
