use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening a dataset and reading its georeferencing.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The raster or its sidecar could not be read from disk
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not usable as a georeferenced raster
    #[error("{path} is not a readable georeferenced raster: {reason}")]
    BadInput { path: PathBuf, reason: String },
}

/// Errors from the image kernel and the geometry operations built on it.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The input image could not be decoded
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// PNG encoding failed
    #[error("failed to encode PNG: {0}")]
    Encode(String),

    /// A scale factor outside the operation's domain (a programming error)
    #[error("{op} called with scale ({sx}, {sy}) outside its valid range")]
    ScaleRange { op: &'static str, sx: f64, sy: f64 },

    /// An extract region that does not lie within the image bounds
    #[error(
        "region {width}x{height}+{left}+{top} exceeds image bounds {image_width}x{image_height}"
    )]
    RegionOutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

/// Errors from the content-addressed tile writer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A tile file or its directory could not be written
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding failed inside a worker
    #[error(transparent)]
    Encode(#[from] RasterError),

    /// A worker task died before completing its write
    #[error("tile worker failed: {0}")]
    Worker(String),
}

/// Errors surfaced by the pyramid orchestrator.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// Image dimensions are not a whole number of tiles at the sliced zoom
    #[error("image size {width}x{height} is not a whole number of {tile_side}px tiles")]
    UnalignedImage {
        width: u32,
        height: u32,
        tile_side: u32,
    },

    /// The dataset's lower-left corner does not land on the tile grid
    #[error("image offset ({x}, {y}) does not land on integer tile coordinates")]
    UnalignedOffset { x: f64, y: f64 },

    /// `--min-zoom` must lie in `[0, native)`
    #[error("min zoom {min} must be below the native zoom {native}")]
    MinZoomOutOfRange { min: u32, native: u32 },

    /// `--max-zoom` must not be below the native zoom
    #[error("max zoom {max} must not be below the native zoom {native}")]
    MaxZoomOutOfRange { max: u32, native: u32 },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
