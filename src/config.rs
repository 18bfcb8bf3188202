//! CLI configuration.
//!
//! All options can also be set through `TMS_*` environment variables:
//!
//! - `TMS_MIN_ZOOM` - lowest zoom to produce below the native resolution
//! - `TMS_MAX_ZOOM` - highest zoom to produce above the native resolution
//! - `TMS_TILE_SIZE` - tile side length in pixels (default: 256)
//! - `TMS_WORKERS` - tile worker threads (default: hardware threads)

use std::path::PathBuf;

use clap::Parser;

use crate::grid::{DEFAULT_TILE_SIDE, MAX_SUPPORTED_ZOOM};

/// Slice a georeferenced raster into a TMS tile pyramid.
///
/// Reads georeferencing from the `<INPUT>.geo.json` sidecar, slices the
/// raster at its native resolution, and optionally walks the pyramid down
/// to `--min-zoom` and up to `--max-zoom`. Identical tiles are written
/// once and deduplicated with relative symlinks.
#[derive(Parser, Debug, Clone)]
#[command(name = "tms-pyramid")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Georeferenced input raster (the `.geo.json` sidecar must sit beside it).
    pub input: PathBuf,

    /// Output directory for the tile tree.
    pub output: PathBuf,

    /// Lowest zoom to produce below the native resolution.
    #[arg(long, env = "TMS_MIN_ZOOM")]
    pub min_zoom: Option<u32>,

    /// Highest zoom to produce above the native resolution.
    #[arg(long, env = "TMS_MAX_ZOOM")]
    pub max_zoom: Option<u32>,

    /// Tile side length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIDE, env = "TMS_TILE_SIZE")]
    pub tile_size: u32,

    /// Tile worker threads. 0 means one per hardware thread.
    #[arg(long, default_value_t = 0, env = "TMS_WORKERS")]
    pub workers: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }

        if let (Some(min), Some(max)) = (self.min_zoom, self.max_zoom) {
            if min > max {
                return Err(format!("min_zoom {min} cannot exceed max_zoom {max}"));
            }
        }

        if let Some(max) = self.max_zoom {
            if max > MAX_SUPPORTED_ZOOM {
                return Err(format!(
                    "max_zoom {max} exceeds the supported maximum of {MAX_SUPPORTED_ZOOM}"
                ));
            }
        }

        Ok(())
    }

    /// The resolved worker count: the configured value, or the number of
    /// hardware threads when left at 0.
    pub fn worker_count(&self) -> usize {
        if self.workers != 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1)
    }
}

// =============================================================================
// Tests
// =============================================================================
