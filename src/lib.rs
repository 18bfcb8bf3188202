//! # TMS Pyramid
//!
//! Slice a georeferenced raster into a pyramid of fixed-size RGBA PNG
//! tiles under the TMS addressing scheme, with content-addressed
//! deduplication of identical tiles.
//!
//! ## How a run works
//!
//! - The dataset collaborator supplies the raster's native resolution and
//!   TMS extents; the raster itself is decoded into a [`Raster`] handle.
//! - The native [`TileLevel`] is aligned to the tile grid and sliced into
//!   `{z}/{x}-{y}-{hash}.png` submissions.
//! - Each lower zoom is derived from its neighbour by an exact half-shrink
//!   under a corner-aligned affine, so intermediates stay tile-aligned;
//!   each higher zoom is stretched from the native image in one shot to
//!   avoid seams at tile boundaries.
//! - [`TileStore`] hashes every tile's pixels, encodes each distinct hash
//!   to PNG exactly once, and writes duplicates as relative symlinks.
//!
//! ## Architecture
//!
//! - [`grid`] - TMS value types and world/footprint arithmetic
//! - [`dataset`] - the georeferencing contract and its sidecar-backed impl
//! - [`raster`] - the image kernel adaptor and geometry operations
//! - [`pyramid`] - per-level slicing and the run orchestrator
//! - [`storage`] - the content-addressed tile writer and its worker pool
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use tms_pyramid::{TilePyramid, TileStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = TileStore::create("tiles", 256, 4)?;
//!     TilePyramid::open("bluemarble.tif".as_ref(), store)?
//!         .with_min_zoom(0)
//!         .with_max_zoom(5)
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod pyramid;
pub mod raster;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use dataset::{sidecar_path, Dataset, SidecarDataset};
pub use error::{DatasetError, PyramidError, RasterError, StorageError};
pub use grid::{
    world_border_tiles, world_side, TileCoord, TileOffset, TileRect, TmsExtents,
    DEFAULT_TILE_SIDE, MAX_SUPPORTED_ZOOM,
};
pub use pyramid::{TileLevel, TilePyramid};
pub use raster::{init_parallelism, FillMode, Raster, BANDS};
pub use storage::{PixelHash, TileStore, DEFAULT_QUEUE_FACTOR};
