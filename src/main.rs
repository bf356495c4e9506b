mod app;
mod chart;
mod config;
mod data;
mod dispatch;
mod error;
mod export;
mod images;
mod state;
mod ui;

use anyhow::{Context, Result};
use app::MyelinApp;
use config::AppConfig;
use dispatch::Dispatcher;
use eframe::egui;
use images::ImageResolver;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let config = AppConfig::load()?;

    let data_path = match config.data_path.clone().or_else(ui::panels::pick_data_file) {
        Some(path) => path,
        None => {
            log::warn!("No observation table selected, exiting");
            return Ok(());
        }
    };

    let dataset = data::loader::load_file(&data_path)
        .with_context(|| format!("loading {}", data_path.display()))?;
    log::info!(
        "Loaded {} observations from {}",
        dataset.len(),
        data_path.display()
    );
    if dataset.is_empty() {
        log::warn!("{} has no usable rows; every chart will show \"No data\"", data_path.display());
    }
    if !config.image_dir.is_dir() {
        log::warn!(
            "Image directory {} does not exist; drill-down images will show as not found",
            config.image_dir.display()
        );
    }

    let dispatcher = Dispatcher::new(dataset.into_handle(), ImageResolver::new(&config.image_dir));

    if let Some(dir) = &config.export_dir {
        export::export_all(&dispatcher, dir)?;
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Myelin Viewer – OL Ensheathment Dashboards",
        options,
        Box::new(move |cc| Ok(Box::new(MyelinApp::new(cc, AppState::new(dispatcher))))),
    )
    .map_err(|e| anyhow::anyhow!("running viewer: {e}"))
}
