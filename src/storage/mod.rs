//! Content-addressed tile persistence.
//!
//! Tiles are written as `{z}/{x}-{y}-{hash}.png` under the output root,
//! where the hash digests the decoded pixel buffer. The first submission
//! of a given hash encodes and writes the PNG; every later submission with
//! the same hash becomes a relative symlink to that first file, so a
//! pyramid full of identical tiles (ocean, border fill) costs one encode
//! and one file.

mod hash;
mod store;

pub use hash::PixelHash;
pub use store::{TileStore, DEFAULT_QUEUE_FACTOR};
