//! The image kernel surface.
//!
//! Wraps the `image` crate behind a small value type so the rest of the
//! crate never touches pixel containers directly. All operations return a
//! fresh handle; nothing mutates in place.
//!
//! The one piece of real machinery here is [`Raster::resample`], the
//! corner-aligned affine rescale the whole pyramid depends on. It maps the
//! input corners at `(-0.5, -0.5) .. (n-0.5, m-0.5)` onto the output
//! corners, i.e. `X = sx*x + (sx-1)/2`, which is the convention that makes
//! exact-fraction downsampling a pure box filter with no extrapolation at
//! the boundary. Repeated half-shrinks of a tile-aligned image therefore
//! stay tile-aligned and reproducible.

use std::path::Path;
use std::sync::Once;

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::error::RasterError;

/// Channels per pixel. Every `Raster` is RGBA, 8 bits per channel.
pub const BANDS: u32 = 4;

static KERNEL_INIT: Once = Once::new();

/// Configure the kernel's internal thread pool.
///
/// Process-wide state, applied exactly once; later calls are no-ops. Must
/// run before the first resample so the pool is not lazily sized by rayon's
/// own defaults.
pub fn init_parallelism(threads: usize) {
    KERNEL_INIT.call_once(|| {
        // A failed build means a pool already exists, which is equivalent.
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global();
    });
}

// =============================================================================
// Fill Modes
// =============================================================================

/// How `embed` paints the canvas outside the placed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Fill bands with 0 (transparent on RGBA)
    Black,
    /// Extend the edge pixels outwards
    Extend,
    /// Tile the image across the canvas
    Tile,
    /// Mirror the image outwards
    Mirror,
    /// Fill bands with 255
    White,
}

// =============================================================================
// Raster
// =============================================================================

/// An 8-bit RGBA image handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    buf: RgbaImage,
}

impl Raster {
    /// Decode an image file into an RGBA raster.
    pub fn open(path: &Path) -> Result<Self, RasterError> {
        let decoded = image::open(path).map_err(|e| RasterError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            buf: decoded.into_rgba8(),
        })
    }

    /// A transparent canvas sized `width x height`.
    pub fn new_rgba(width: u32, height: u32) -> Self {
        Self {
            buf: RgbaImage::new(width, height),
        }
    }

    /// A solid canvas filled with `ink`.
    pub fn new_rgba_with_ink(width: u32, height: u32, ink: [u8; 4]) -> Self {
        Self {
            buf: RgbaImage::from_pixel(width, height, Rgba(ink)),
        }
    }

    pub fn from_rgba(buf: RgbaImage) -> Self {
        Self { buf }
    }

    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    pub fn bands(&self) -> u32 {
        BANDS
    }

    /// The decoded pixel buffer, rows in row-major order.
    pub fn pixel_bytes(&self) -> &[u8] {
        self.buf.as_raw()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.buf
    }

    /// Place this image on a `width x height` canvas at `(left, top)`,
    /// painting the remainder according to `fill`.
    pub fn embed(&self, fill: FillMode, left: u32, top: u32, width: u32, height: u32) -> Raster {
        let (w, h) = (self.width() as i64, self.height() as i64);
        let buf = RgbaImage::from_fn(width, height, |x, y| {
            let sx = x as i64 - left as i64;
            let sy = y as i64 - top as i64;
            if sx >= 0 && sx < w && sy >= 0 && sy < h {
                return *self.buf.get_pixel(sx as u32, sy as u32);
            }
            match fill {
                FillMode::Black => Rgba([0, 0, 0, 0]),
                FillMode::White => Rgba([255, 255, 255, 255]),
                FillMode::Extend => *self
                    .buf
                    .get_pixel(sx.clamp(0, w - 1) as u32, sy.clamp(0, h - 1) as u32),
                FillMode::Tile => *self
                    .buf
                    .get_pixel(sx.rem_euclid(w) as u32, sy.rem_euclid(h) as u32),
                FillMode::Mirror => *self.buf.get_pixel(reflect(sx, w), reflect(sy, h)),
            }
        });
        Raster { buf }
    }

    /// Crop a region out of this image. The region must lie within bounds.
    pub fn extract_area(
        &self,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Result<Raster, RasterError> {
        let in_x = u64::from(left) + u64::from(width) <= u64::from(self.width());
        let in_y = u64::from(top) + u64::from(height) <= u64::from(self.height());
        if !in_x || !in_y {
            return Err(RasterError::RegionOutOfBounds {
                left,
                top,
                width,
                height,
                image_width: self.width(),
                image_height: self.height(),
            });
        }
        Ok(Raster {
            buf: image::imageops::crop_imm(&self.buf, left, top, width, height).to_image(),
        })
    }

    /// Rescale by `(sx, sy)` under the corner-aligned affine convention.
    ///
    /// Output size is `(floor(W*sx), floor(H*sy))`. Each axis filters
    /// independently: box weights when shrinking (the output pixel covers
    /// the source interval `[o/s, (o+1)/s)` exactly), two-tap linear
    /// interpolation with edge clamping when enlarging. Accumulation is in
    /// f64 and rounded once, so a chain of exact half-shrinks reproduces
    /// the direct shrink.
    pub fn resample(&self, sx: f64, sy: f64) -> Raster {
        let (w, h) = (self.width(), self.height());
        let out_w = (w as f64 * sx) as u32;
        let out_h = (h as f64 * sy) as u32;
        if out_w == 0 || out_h == 0 || w == 0 || h == 0 {
            return Raster::new_rgba(out_w, out_h);
        }

        let col_taps = axis_taps(sx, w, out_w);
        let row_taps = axis_taps(sy, h, out_h);

        let src = self.buf.as_raw();
        let stride_in = (w * BANDS) as usize;
        let stride_out = (out_w * BANDS) as usize;

        // Horizontal pass into an f64 working buffer of out_w x h.
        let mut mid = vec![0.0f64; stride_out * h as usize];
        mid.par_chunks_mut(stride_out)
            .enumerate()
            .for_each(|(y, mid_row)| {
                let row = &src[y * stride_in..(y + 1) * stride_in];
                for (o, (start, weights)) in col_taps.iter().enumerate() {
                    let mut acc = [0.0f64; BANDS as usize];
                    for (k, wgt) in weights.iter().enumerate() {
                        let i = (*start as usize + k) * BANDS as usize;
                        for (c, a) in acc.iter_mut().enumerate() {
                            *a += f64::from(row[i + c]) * wgt;
                        }
                    }
                    mid_row[o * BANDS as usize..(o + 1) * BANDS as usize].copy_from_slice(&acc);
                }
            });

        // Vertical pass into the output buffer.
        let mut out = vec![0u8; stride_out * out_h as usize];
        out.par_chunks_mut(stride_out)
            .enumerate()
            .for_each(|(oy, out_row)| {
                let (start, weights) = &row_taps[oy];
                for (x, px) in out_row.iter_mut().enumerate() {
                    let mut acc = 0.0f64;
                    for (k, wgt) in weights.iter().enumerate() {
                        acc += mid[(*start as usize + k) * stride_out + x] * wgt;
                    }
                    *px = acc.round().clamp(0.0, 255.0) as u8;
                }
            });

        let mut buf = RgbaImage::new(out_w, out_h);
        buf.copy_from_slice(&out);
        Raster { buf }
    }

    /// Encode to PNG (RGBA, 8 bits per channel).
    pub fn encode_png(&self) -> Result<Bytes, RasterError> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                self.buf.as_raw(),
                self.width(),
                self.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| RasterError::Encode(e.to_string()))?;
        Ok(Bytes::from(bytes))
    }
}

/// Reflect an out-of-range index back into `[0, len)`.
fn reflect(i: i64, len: i64) -> u32 {
    let period = 2 * len;
    let m = i.rem_euclid(period);
    if m < len {
        m as u32
    } else {
        (period - 1 - m) as u32
    }
}

/// Per-output-pixel filter taps for one axis: `(first_input_index, weights)`.
fn axis_taps(scale: f64, in_len: u32, out_len: u32) -> Vec<(u32, Vec<f64>)> {
    (0..out_len)
        .map(|o| {
            if scale < 1.0 {
                // Box filter over the source interval this output pixel covers.
                let u0 = (o as f64 / scale).min(in_len as f64);
                let u1 = ((o as f64 + 1.0) / scale).min(in_len as f64);
                let i0 = u0.floor() as u32;
                let i1 = (u1.ceil() as u32).clamp(i0 + 1, in_len);
                let total = u1 - u0;
                let weights = (i0..i1)
                    .map(|i| {
                        let lo = (i as f64).max(u0);
                        let hi = (i as f64 + 1.0).min(u1);
                        (hi - lo).max(0.0) / total
                    })
                    .collect();
                (i0, weights)
            } else {
                // Linear interpolation at the corner-aligned sample point.
                let center = (o as f64 + 0.5) / scale - 0.5;
                let base = center.floor();
                let frac = center - base;
                let i0 = (base as i64).clamp(0, i64::from(in_len) - 1) as u32;
                let i1 = (base as i64 + 1).clamp(0, i64::from(in_len) - 1) as u32;
                if i0 == i1 || frac == 0.0 {
                    (i0, vec![1.0])
                } else {
                    (i0, vec![1.0 - frac, frac])
                }
            }
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
