//! The pyramid orchestrator.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::dataset::{Dataset, SidecarDataset};
use crate::error::PyramidError;
use crate::grid::DEFAULT_TILE_SIDE;
use crate::raster::Raster;
use crate::storage::TileStore;

use super::level::TileLevel;

/// Drives one raster through a full pyramid run.
///
/// The native level is sliced first, then the downward chain shrinks
/// level-by-level (each half-shrink sees an already aligned image), then
/// each upper zoom is stretched directly from the native level (never from
/// the previous upsample, which would accumulate interpolation error).
pub struct TilePyramid<D: Dataset> {
    dataset: D,
    image: Raster,
    store: TileStore,
    tile_side: u32,
    min_zoom: Option<u32>,
    max_zoom: Option<u32>,
}

impl TilePyramid<SidecarDataset> {
    /// Open `input` and its georeferencing sidecar with the default tile side.
    pub fn open(input: &Path, store: TileStore) -> Result<Self, PyramidError> {
        Self::open_with_tile_side(input, store, DEFAULT_TILE_SIDE)
    }

    pub fn open_with_tile_side(
        input: &Path,
        store: TileStore,
        tile_side: u32,
    ) -> Result<Self, PyramidError> {
        let dataset = SidecarDataset::open(input, tile_side)?;
        let image = Raster::open(input)?;
        Ok(Self::new(dataset, image, store, tile_side))
    }
}

impl<D: Dataset> TilePyramid<D> {
    pub fn new(dataset: D, image: Raster, store: TileStore, tile_side: u32) -> Self {
        Self {
            dataset,
            image,
            store,
            tile_side,
            min_zoom: None,
            max_zoom: None,
        }
    }

    /// Also produce every zoom below the native zoom, down to `min`.
    pub fn with_min_zoom(mut self, min: u32) -> Self {
        self.min_zoom = Some(min);
        self
    }

    /// Also produce every zoom above the native zoom, up to `max`.
    pub fn with_max_zoom(mut self, max: u32) -> Self {
        self.max_zoom = Some(max);
        self
    }

    /// Slice the whole pyramid and block until every tile is durable.
    pub async fn run(self) -> Result<(), PyramidError> {
        let native_zoom = self.dataset.native_resolution();
        self.validate_zoom_range(native_zoom)?;

        let started = Instant::now();
        let TilePyramid {
            dataset,
            image,
            store,
            tile_side,
            min_zoom,
            max_zoom,
        } = self;

        // Alignment is checked before anything is submitted, so a rejected
        // input leaves the output directory empty.
        let offset = dataset.tms_extents().lower_left;
        if !offset.is_integral() {
            return Err(PyramidError::UnalignedOffset {
                x: offset.x,
                y: offset.y,
            });
        }
        let (width, height) = (image.width(), image.height());
        if width % tile_side != 0 || height % tile_side != 0 {
            return Err(PyramidError::UnalignedImage {
                width,
                height,
                tile_side,
            });
        }

        let native = TileLevel::new(image, offset, native_zoom, tile_side);
        emit_level(&dataset, &store, &native).await?;

        if let Some(min) = min_zoom {
            let mut level = native.downsample(1)?;
            loop {
                emit_level(&dataset, &store, &level).await?;
                if level.zoom() == min {
                    break;
                }
                level = level.downsample(1)?;
            }
        }

        if let Some(max) = max_zoom {
            for zoom in (native_zoom + 1)..=max {
                let level = native.upsample(zoom - native_zoom)?;
                emit_level(&dataset, &store, &level).await?;
            }
        }

        store.wait_all().await?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            native_zoom, "pyramid complete"
        );
        Ok(())
    }

    fn validate_zoom_range(&self, native: u32) -> Result<(), PyramidError> {
        if let Some(min) = self.min_zoom {
            if min >= native {
                return Err(PyramidError::MinZoomOutOfRange { min, native });
            }
        }
        if let Some(max) = self.max_zoom {
            if max < native {
                return Err(PyramidError::MaxZoomOutOfRange { max, native });
            }
        }
        Ok(())
    }
}

/// Fill the level's world borders, then slice it.
async fn emit_level<D: Dataset>(
    dataset: &D,
    store: &TileStore,
    level: &TileLevel,
) -> Result<(), PyramidError> {
    let (columns, rows) = level.tile_counts();
    debug!(zoom = level.zoom(), columns, rows, "slicing level");

    level
        .fill_borders(dataset.world_tms_borders(level.zoom()), store)
        .await?;
    level.slice(store).await?;

    info!(
        zoom = level.zoom(),
        tiles = u64::from(columns) * u64::from(rows),
        "level sliced"
    );
    Ok(())
}
