#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod chart;
mod config;
mod error;
mod map;
mod maps_api;
mod model;
mod store;
mod ui;

use config::AppConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = AppConfig::from_env();
    log::info!("starting with {:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("outreach-io")
        .enable_all()
        .build()?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(1280.0, 900.0))
            .with_min_inner_size(egui::vec2(640.0, 480.0))
            .with_title("Outreach Profiles")
            .with_resizable(true)
            .with_decorations(true)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Outreach Profiles",
        native_options,
        Box::new(move |cc| Ok(Box::new(ui::app::OutreachApp::new(cc, config, runtime)))),
    )?;
    Ok(())
}
