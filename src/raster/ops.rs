//! TMS geometry operations on [`Raster`].
//!
//! `shrink` and `stretch` are the two halves of the resampling chain the
//! pyramid walks; `tms_align` pads an image until its dimensions are whole
//! tiles and its lower-left corner sits on integer TMS coordinates.

use crate::error::RasterError;
use crate::grid::TileOffset;

use super::image::{FillMode, Raster};

impl Raster {
    /// Shrink by `(sx, sy)`, each in `(0, 1]`.
    pub fn shrink(&self, sx: f64, sy: f64) -> Result<Raster, RasterError> {
        if !(0.0 < sx && sx <= 1.0) || !(0.0 < sy && sy <= 1.0) {
            return Err(RasterError::ScaleRange {
                op: "shrink",
                sx,
                sy,
            });
        }
        Ok(self.resample(sx, sy))
    }

    /// Stretch by `(sx, sy)`, each at least 1.
    ///
    /// The image is embedded in a one-pixel `Extend` frame before scaling
    /// and cropped back afterwards, so interpolation near the edge never
    /// reads missing data and the result has no dark border.
    pub fn stretch(&self, sx: f64, sy: f64) -> Result<Raster, RasterError> {
        if sx < 1.0 || sy < 1.0 {
            return Err(RasterError::ScaleRange {
                op: "stretch",
                sx,
                sy,
            });
        }

        let (w, h) = (self.width(), self.height());
        let framed = self.embed(FillMode::Extend, 1, 1, w + 2, h + 2);
        let scaled = framed.resample(sx, sy);
        scaled.extract_area(
            sx as u32,
            sy as u32,
            (w as f64 * sx) as u32,
            (h as f64 * sy) as u32,
        )
    }

    /// Pad this image onto the TMS grid.
    ///
    /// `offset` is the TMS position of the lower-left corner in tile units.
    /// The result's dimensions are whole multiples of `tile_side` and its
    /// lower-left tile sits on integer TMS coordinates; padding is
    /// transparent. Returns the image unchanged when it is already aligned.
    pub fn tms_align(self, tile_side: u32, offset: TileOffset) -> Raster {
        let side = i64::from(tile_side);

        // Pixel offset from the top-left of the aligned image. The y term
        // converts the lower-left offset to the top-left origin.
        let x = ((offset.x * tile_side as f64).round() as i64).rem_euclid(side) as u32;
        let y = ((self.height() as f64 - offset.y * tile_side as f64).round() as i64)
            .rem_euclid(side) as u32;

        // Tile counts rounded up to provide right and bottom borders.
        let tiles_x = ((self.width() as f64 + x as f64 / 2.0) / tile_side as f64).ceil() as u32;
        let tiles_y = ((self.height() as f64 + y as f64 / 2.0) / tile_side as f64).ceil() as u32;

        let width = tiles_x * tile_side;
        let height = tiles_y * tile_side;

        if width == self.width() && height == self.height() {
            debug_assert!(x == 0 && y == 0);
            return self;
        }

        self.embed(FillMode::Black, x, y, width, height)
    }
}

// =============================================================================
// Tests
// =============================================================================
