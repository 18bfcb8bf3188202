//! Full pyramid runs: zoom windows, per-level tile counts, border fill.

use tms_pyramid::{PyramidError, TilePyramid, TileStore};

use super::test_utils::{
    regular_files_and_links, write_gradient_raster, write_georef, zoom_entries, zoom_levels,
    TILE_SIDE,
};

#[tokio::test]
async fn test_downsampled_pyramid_tile_counts() {
    // 1024x1024 at native zoom 2, downsampled to zoom 0: the world grid
    // shrinks 16 -> 4 -> 1.
    let dir = tempfile::tempdir().unwrap();
    let raster = write_gradient_raster(dir.path(), "bluemarble.png", 1024, 1024);
    write_georef(&raster, 2, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 4).unwrap();
    TilePyramid::open(&raster, store)
        .unwrap()
        .with_min_zoom(0)
        .run()
        .await
        .unwrap();

    assert_eq!(zoom_levels(&output), vec![0, 1, 2]);
    assert_eq!(zoom_entries(&output, 0).len(), 1);
    assert_eq!(zoom_entries(&output, 1).len(), 4);
    assert_eq!(zoom_entries(&output, 2).len(), 16);
}

#[tokio::test]
async fn test_upsampled_pyramid_tile_counts() {
    let dir = tempfile::tempdir().unwrap();
    let raster = write_gradient_raster(dir.path(), "bluemarble.png", 1024, 1024);
    write_georef(&raster, 2, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 4).unwrap();
    TilePyramid::open(&raster, store)
        .unwrap()
        .with_max_zoom(3)
        .run()
        .await
        .unwrap();

    assert_eq!(zoom_levels(&output), vec![2, 3]);
    assert_eq!(zoom_entries(&output, 2).len(), 16);
    // Zoom 3 is the full 8x8 world grid.
    assert_eq!(zoom_entries(&output, 3).len(), 64);
}

#[tokio::test]
async fn test_partial_footprint_fills_borders() {
    // One tile of a 2x2 world: the other three addresses are border tiles
    // sharing a single transparent file.
    let dir = tempfile::tempdir().unwrap();
    let raster = write_gradient_raster(dir.path(), "corner.png", 256, 256);
    write_georef(&raster, 1, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 4).unwrap();
    TilePyramid::open(&raster, store).unwrap().run().await.unwrap();

    let entries = zoom_entries(&output, 1);
    assert_eq!(entries.len(), 4);

    let (regular, links) = regular_files_and_links(&output);
    // The content tile plus one canonical border file; the two remaining
    // borders are symlinks.
    assert_eq!(regular.len(), 2);
    assert_eq!(links.len(), 2);

    // The canonical border tile is fully transparent.
    let border = regular
        .iter()
        .map(|path| image::open(path).unwrap().into_rgba8())
        .find(|img| img.pixels().all(|px| px.0 == [0, 0, 0, 0]));
    assert!(border.is_some());
}

#[tokio::test]
async fn test_min_zoom_at_native_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let raster = write_gradient_raster(dir.path(), "bluemarble.png", 1024, 1024);
    write_georef(&raster, 2, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 2).unwrap();
    let result = TilePyramid::open(&raster, store)
        .unwrap()
        .with_min_zoom(2)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(PyramidError::MinZoomOutOfRange { min: 2, native: 2 })
    ));
}

#[tokio::test]
async fn test_max_zoom_below_native_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let raster = write_gradient_raster(dir.path(), "bluemarble.png", 1024, 1024);
    write_georef(&raster, 2, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 2).unwrap();
    let result = TilePyramid::open(&raster, store)
        .unwrap()
        .with_max_zoom(1)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(PyramidError::MaxZoomOutOfRange { max: 1, native: 2 })
    ));
}

#[tokio::test]
async fn test_full_window_produces_every_zoom() {
    let dir = tempfile::tempdir().unwrap();
    let raster = write_gradient_raster(dir.path(), "bluemarble.png", 512, 512);
    write_georef(&raster, 1, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 4).unwrap();
    TilePyramid::open(&raster, store)
        .unwrap()
        .with_min_zoom(0)
        .with_max_zoom(3)
        .run()
        .await
        .unwrap();

    assert_eq!(zoom_levels(&output), vec![0, 1, 2, 3]);
    for zoom in 0..=3u32 {
        let world_tiles = 1usize << (2 * zoom);
        assert_eq!(zoom_entries(&output, zoom).len(), world_tiles);
    }
}
