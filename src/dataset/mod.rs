//! The dataset collaborator.
//!
//! The pyramid core consumes exactly three facts about a georeferenced
//! raster: its native resolution (the zoom at which one source pixel is one
//! tile pixel), its TMS extents, and the set of world tiles outside its
//! footprint at a given zoom. [`Dataset`] captures that contract.
//!
//! Warping, reprojection, and driver-level raster inspection stay outside
//! this crate; [`SidecarDataset`] implements the contract from a small JSON
//! sidecar (`<raster>.geo.json`) written by whatever produced the warped
//! raster:
//!
//! ```json
//! { "native_zoom": 2, "lower_left": [0.0, 0.0] }
//! ```
//!
//! `lower_left` is the TMS position of the image's lower-left corner in
//! tile units at the native zoom; the upper-right corner derives from the
//! raster's pixel dimensions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DatasetError;
use crate::grid::{world_border_tiles, TileCoord, TileOffset, TmsExtents, MAX_SUPPORTED_ZOOM};

/// Georeferencing facts the pyramid consumes.
pub trait Dataset {
    /// The zoom at which one source pixel maps to one tile pixel.
    fn native_resolution(&self) -> u32;

    /// Bounding TMS corners, in tile units at the native resolution.
    fn tms_extents(&self) -> TmsExtents;

    /// Tiles inside the world at `zoom` but outside the dataset footprint.
    fn world_tms_borders(&self, zoom: u32) -> Box<dyn Iterator<Item = TileCoord>> {
        let footprint = self
            .tms_extents()
            .footprint(self.native_resolution(), zoom);
        Box::new(world_border_tiles(zoom, footprint))
    }
}

// =============================================================================
// Sidecar-backed implementation
// =============================================================================

#[derive(Debug, Deserialize)]
struct SidecarGeoref {
    native_zoom: u32,
    lower_left: (f64, f64),
}

/// A [`Dataset`] read from a raster file plus its `.geo.json` sidecar.
#[derive(Debug, Clone)]
pub struct SidecarDataset {
    native_zoom: u32,
    extents: TmsExtents,
}

impl SidecarDataset {
    /// Open `raster` and its sidecar.
    ///
    /// A missing raster or sidecar is an I/O failure; a sidecar that does
    /// not parse, or a raster the image kernel cannot size, means the input
    /// is not usable as a georeferenced raster.
    pub fn open(raster: &Path, tile_side: u32) -> Result<Self, DatasetError> {
        fs::metadata(raster).map_err(|e| DatasetError::Io {
            path: raster.to_path_buf(),
            source: e,
        })?;

        let sidecar = sidecar_path(raster);
        let text = fs::read_to_string(&sidecar).map_err(|e| DatasetError::Io {
            path: sidecar.clone(),
            source: e,
        })?;
        let georef: SidecarGeoref =
            serde_json::from_str(&text).map_err(|e| DatasetError::BadInput {
                path: sidecar.clone(),
                reason: e.to_string(),
            })?;
        if georef.native_zoom > MAX_SUPPORTED_ZOOM {
            return Err(DatasetError::BadInput {
                path: sidecar,
                reason: format!(
                    "native zoom {} exceeds the supported maximum of {MAX_SUPPORTED_ZOOM}",
                    georef.native_zoom
                ),
            });
        }

        let (width, height) =
            image::image_dimensions(raster).map_err(|e| DatasetError::BadInput {
                path: raster.to_path_buf(),
                reason: e.to_string(),
            })?;

        let lower_left = TileOffset::new(georef.lower_left.0, georef.lower_left.1);
        let upper_right = TileOffset::new(
            lower_left.x + f64::from(width) / f64::from(tile_side),
            lower_left.y + f64::from(height) / f64::from(tile_side),
        );

        Ok(Self {
            native_zoom: georef.native_zoom,
            extents: TmsExtents::new(lower_left, upper_right),
        })
    }
}

impl Dataset for SidecarDataset {
    fn native_resolution(&self) -> u32 {
        self.native_zoom
    }

    fn tms_extents(&self) -> TmsExtents {
        self.extents
    }
}

/// The sidecar location for a raster: the raster path with `.geo.json`
/// appended (`bluemarble.tif` -> `bluemarble.tif.geo.json`).
pub fn sidecar_path(raster: &Path) -> PathBuf {
    let mut name = raster.as_os_str().to_os_string();
    name.push(".geo.json");
    PathBuf::from(name)
}

// =============================================================================
// Tests
// =============================================================================
