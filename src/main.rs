//! tms-pyramid - slice a georeferenced raster into a TMS tile pyramid.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tms_pyramid::{init_parallelism, Config, TilePyramid, TileStore};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let workers = config.worker_count();
    init_parallelism(workers);

    info!("Input: {}", config.input.display());
    info!("Output: {}", config.output.display());
    info!(
        "Tile side: {}px, workers: {}",
        config.tile_size, workers
    );
    match (config.min_zoom, config.max_zoom) {
        (Some(min), Some(max)) => info!("Zoom window: {} to {}", min, max),
        (Some(min), None) => info!("Downsampling to zoom {}", min),
        (None, Some(max)) => info!("Upsampling to zoom {}", max),
        (None, None) => info!("Native resolution only"),
    }

    let store = match TileStore::create(&config.output, config.tile_size, workers) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to prepare {}: {}", config.output.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut pyramid =
        match TilePyramid::open_with_tile_side(&config.input, store, config.tile_size) {
            Ok(pyramid) => pyramid,
            Err(e) => {
                error!("Failed to open {}: {}", config.input.display(), e);
                return ExitCode::FAILURE;
            }
        };
    if let Some(min) = config.min_zoom {
        pyramid = pyramid.with_min_zoom(min);
    }
    if let Some(max) = config.max_zoom {
        pyramid = pyramid.with_max_zoom(max);
    }

    if let Err(e) = pyramid.run().await {
        error!("Pyramid run failed: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tms_pyramid=debug"
    } else {
        "tms_pyramid=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
