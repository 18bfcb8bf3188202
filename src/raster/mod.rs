//! Image kernel adaptor and geometry operations.
//!
//! [`Raster`] is the crate's image handle: an opaque value type over an
//! 8-bit RGBA buffer. `image.rs` hosts the kernel surface (decode, embed,
//! extract, the corner-aligned resampler, PNG encode); `ops.rs` layers the
//! TMS geometry operations (`shrink`, `stretch`, `tms_align`) on top of it.

mod image;
mod ops;

pub use image::{init_parallelism, FillMode, Raster, BANDS};
