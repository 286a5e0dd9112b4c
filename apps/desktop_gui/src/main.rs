mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::load_settings;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::ActivitiesApp;

#[derive(Parser, Debug)]
#[command(name = "activities-gui", about = "Mergington High School activities signup")]
struct Args {
    /// Overrides the configured server URL.
    #[arg(long)]
    server_url: Option<String>,
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let args = Args::parse();
    let mut settings = load_settings();
    if let Some(server_url) = args.server_url.as_deref() {
        settings = settings.with_server_url(server_url);
    }
    tracing::info!(server_url = %settings.server_url, "starting activities gui");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let server_url = settings.server_url.clone();
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Mergington High School Activities")
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Mergington High School Activities",
        options,
        Box::new(move |_cc| Ok(Box::new(ActivitiesApp::new(cmd_tx, ui_rx, server_url)))),
    )
}
