mod api;
mod app;
mod config;
mod graph;
mod util;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::api::{DataFetcher, HttpGraphApi};
use crate::config::{Args, Config};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("brainvault_graph=info")),
        )
        .with(fmt::layer())
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let config = Config::try_from(Args::parse()).context("invalid configuration")?;
    info!(api_url = %config.api_url, "starting knowledge graph viewer");

    let api = HttpGraphApi::new(&config.api_url, config.request_timeout)?;
    let fetcher = DataFetcher::start(Arc::new(api), config.intervals);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "BrainVault Graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::KnowledgeGraphApp::new(cc, &config, fetcher)))),
    )
    .map_err(|error| anyhow!("failed to run the viewer: {error}"))
}
