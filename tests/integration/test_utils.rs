//! Test utilities for integration tests.
//!
//! Helpers for synthesising georeferenced rasters on disk and for
//! inspecting the tile trees a run produces.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use tms_pyramid::{sidecar_path, PixelHash};

/// Side length used throughout the integration tests.
pub const TILE_SIDE: u32 = 256;

/// Write a gradient raster whose tiles all have distinct content.
///
/// The channel ramps move slowly (`x / 4`) so neighbouring tiles never
/// repeat the same byte pattern within the sizes used here.
pub fn write_gradient_raster(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x / 4 % 256) as u8, (y / 4 % 256) as u8, 128, 255])
    });
    img.save(&path).unwrap();
    path
}

/// Write a single-colour raster.
pub fn write_uniform_raster(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    ink: [u8; 4],
) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(width, height, Rgba(ink))
        .save(&path)
        .unwrap();
    path
}

/// Write the georeferencing sidecar next to `raster`.
pub fn write_georef(raster: &Path, native_zoom: u32, lower_left: (f64, f64)) {
    let body = format!(
        r#"{{ "native_zoom": {}, "lower_left": [{}, {}] }}"#,
        native_zoom, lower_left.0, lower_left.1
    );
    fs::write(sidecar_path(raster), body).unwrap();
}

/// All entries under one zoom directory, sorted.
pub fn zoom_entries(output: &Path, zoom: u32) -> Vec<PathBuf> {
    let dir = output.join(zoom.to_string());
    let mut entries: Vec<_> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("missing zoom directory {}: {e}", dir.display()))
        .map(|entry| entry.unwrap().path())
        .collect();
    entries.sort();
    entries
}

/// The zoom directories present under the output root, sorted.
pub fn zoom_levels(output: &Path) -> Vec<u32> {
    let mut zooms: Vec<u32> = fs::read_dir(output)
        .unwrap()
        .map(|entry| {
            entry
                .unwrap()
                .file_name()
                .into_string()
                .unwrap()
                .parse()
                .unwrap()
        })
        .collect();
    zooms.sort_unstable();
    zooms
}

/// The `x-y` address prefixes present under one zoom directory.
pub fn addresses(output: &Path, zoom: u32) -> BTreeSet<String> {
    zoom_entries(output, zoom)
        .iter()
        .map(|path| {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let mut parts = name.splitn(3, '-');
            format!("{}-{}", parts.next().unwrap(), parts.next().unwrap())
        })
        .collect()
}

/// The hash component of a tile filename.
pub fn filename_hash(path: &Path) -> PixelHash {
    let name = path.file_name().unwrap().to_string_lossy();
    let hex = name
        .rsplit('-')
        .next()
        .unwrap()
        .strip_suffix(".png")
        .unwrap();
    PixelHash::from_hex(hex).unwrap()
}

/// Split every tile in the output tree into regular files and symlinks.
pub fn regular_files_and_links(output: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut regular = Vec::new();
    let mut links = Vec::new();
    for zoom in zoom_levels(output) {
        for path in zoom_entries(output, zoom) {
            if path.symlink_metadata().unwrap().is_symlink() {
                links.push(path);
            } else {
                regular.push(path);
            }
        }
    }
    (regular, links)
}
