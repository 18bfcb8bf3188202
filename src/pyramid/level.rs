//! One zoom level of the pyramid.

use crate::error::PyramidError;
use crate::grid::{TileCoord, TileOffset};
use crate::raster::Raster;
use crate::storage::TileStore;

/// An aligned image at one TMS resolution.
///
/// Invariants: the image's dimensions are whole multiples of the tile side
/// and `offset` is integer-valued (it names the TMS tile under the image's
/// lower-left corner). Levels are immutable; slicing reads the image, the
/// `downsample`/`upsample` constructors derive new levels from it.
#[derive(Debug)]
pub struct TileLevel {
    image: Raster,
    offset: TileOffset,
    zoom: u32,
    tile_side: u32,
}

impl TileLevel {
    pub fn new(image: Raster, offset: TileOffset, zoom: u32, tile_side: u32) -> Self {
        debug_assert!(offset.is_integral());
        Self {
            image,
            offset,
            zoom,
            tile_side,
        }
    }

    pub fn image(&self) -> &Raster {
        &self.image
    }

    pub fn offset(&self) -> TileOffset {
        self.offset
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Number of tiles this level slices into, as `(columns, rows)`.
    pub fn tile_counts(&self) -> (u32, u32) {
        (
            self.image.width() / self.tile_side,
            self.image.height() / self.tile_side,
        )
    }

    /// Cut the image into tiles and submit each to the store.
    ///
    /// The grid walk uses top-left pixel coordinates; the emitted addresses
    /// are TMS, so the row index flips against the image height.
    pub async fn slice(&self, store: &TileStore) -> Result<(), PyramidError> {
        let side = self.tile_side;
        let (width, height) = (self.image.width(), self.image.height());
        if width % side != 0 || height % side != 0 {
            return Err(PyramidError::UnalignedImage {
                width,
                height,
                tile_side: side,
            });
        }

        for y in (0..height).step_by(side as usize) {
            for x in (0..width).step_by(side as usize) {
                let tile = self.image.extract_area(x, y, side, side)?;
                let tms_x = i64::from(x / side) + self.offset.x as i64;
                let tms_y = i64::from((height - y) / side) + self.offset.y as i64 - 1;
                store
                    .save(TileCoord::new(self.zoom, tms_x as u32, tms_y as u32), tile)
                    .await?;
            }
        }
        Ok(())
    }

    /// Submit the canonical transparent tile for each border coordinate.
    pub async fn fill_borders(
        &self,
        borders: impl Iterator<Item = TileCoord>,
        store: &TileStore,
    ) -> Result<(), PyramidError> {
        for coord in borders {
            store.save_border(coord).await?;
        }
        Ok(())
    }

    /// Derive the level `levels` zooms down by repeated half-shrinks.
    ///
    /// Each step halves the offset, shrinks by exactly 1/2, and re-aligns
    /// before the next step runs, so every intermediate stays on the tile
    /// grid and the box filter never sees a misaligned input. The chain
    /// must not be collapsed into a single shrink.
    pub fn downsample(&self, levels: u32) -> Result<TileLevel, PyramidError> {
        debug_assert!(levels > 0 && self.zoom >= levels);

        let mut offset = self.offset;
        let mut zoom = self.zoom;
        let mut image: Option<Raster> = None;
        for _ in 0..levels {
            offset = offset.halved();
            zoom -= 1;
            let source = image.as_ref().unwrap_or(&self.image);
            let shrunk = source.shrink(0.5, 0.5)?;
            image = Some(shrunk.tms_align(self.tile_side, offset));
        }

        let image = match image {
            Some(image) => image,
            None => self.image.clone(),
        };
        Ok(TileLevel::new(
            image,
            offset.floored(),
            zoom,
            self.tile_side,
        ))
    }

    /// Derive the level `levels` zooms up in a single stretch.
    ///
    /// The whole image scales as one piece; stretching tile-by-tile would
    /// leave visible seams at tile boundaries.
    pub fn upsample(&self, levels: u32) -> Result<TileLevel, PyramidError> {
        debug_assert!(levels > 0);

        let scale = f64::from(1u32 << levels);
        let offset = self.offset.scaled(scale);
        let stretched = self.image.stretch(scale, scale)?;
        let aligned = stretched.tms_align(self.tile_side, offset);
        Ok(TileLevel::new(
            aligned,
            offset,
            self.zoom + levels,
            self.tile_side,
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================
