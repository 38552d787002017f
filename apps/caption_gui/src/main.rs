mod backend_bridge;
mod config;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::config::CliArgs;
use crate::controller::events::UiEvent;
use crate::ui::{CaptionApp, APP_TITLE};

fn main() -> eframe::Result<()> {
    let args = CliArgs::parse();
    let (settings, config_error) = config::load_settings(&args, |name| std::env::var(name).ok());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Some(err) = config_error {
        tracing::warn!("ignoring settings file, using defaults: {err:#}");
    }
    tracing::info!(endpoint = %settings.endpoint_url, "starting caption gui");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(16);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(64);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, &settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([560.0, 640.0])
            .with_min_inner_size([420.0, 520.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(CaptionApp::new(&cc.egui_ctx, cmd_tx, ui_rx)))),
    )
}
