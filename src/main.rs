// src/main.rs
mod engine;
mod gui;
mod types;
use anyhow::{Context, Result};
use burstscope::resampler::{ResamplerConfig, ResamplingPipeline};
use eframe::egui;

fn load_config() -> Result<ResamplerConfig> {
    match std::env::args().nth(1) {
        Some(path) => ResamplerConfig::load(&path)
            .with_context(|| format!("failed to load resampler config from {path}")),
        None => Ok(ResamplerConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let config = load_config()?;
    log::info!("starting with {config:?}");
    let (pipeline, sink, points) = ResamplingPipeline::new(config.clone())?
        .spawn()
        .context("failed to start resampling pipeline")?;

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 760.0])
        .with_min_inner_size([900.0, 540.0])
        .with_title("burstscope");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "burstscope",
        options,
        Box::new(move |_cc| Box::new(gui::ScopeApp::new(config, pipeline, points, sink))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}
