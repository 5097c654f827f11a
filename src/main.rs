use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod errors;
mod models;
mod routes;
mod server;
mod services;
mod utils;

use models::station::StationCatalogue;
use services::{grid, CoreServices, RefreshScheduler};
use utils::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;

    let catalogue = StationCatalogue::load(config.stations_file.as_deref(), |lat, lon| {
        grid::locate(lat, lon).is_ok()
    })
    .context("Failed to load station catalogue")?;

    let in_grid = catalogue
        .stations()
        .iter()
        .filter(|s| s.in_forecast_grid)
        .count();
    info!(
        "Loaded {} stations ({} inside forecast grids)",
        catalogue.len(),
        in_grid
    );

    let core = Arc::new(CoreServices::new(config, catalogue)?);
    let scheduler = RefreshScheduler::start(core.clone());

    info!(
        "Starting server on http://{}:{}",
        core.config.host, core.config.port
    );
    server::run(core.clone()).await?;

    scheduler.shutdown().await;
    Ok(())
}
