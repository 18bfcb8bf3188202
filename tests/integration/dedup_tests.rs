//! Content-addressed deduplication across a whole run.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tms_pyramid::{PixelHash, TilePyramid, TileStore};

use super::test_utils::{
    filename_hash, regular_files_and_links, write_uniform_raster, write_georef, TILE_SIDE,
};

#[tokio::test]
async fn test_uniform_upsample_collapses_to_one_file() {
    // A uniform raster stays uniform through every stretch, so all tiles
    // of every zoom share one pixel hash: exactly one regular file, the
    // rest symlinks that resolve back to it.
    let dir = tempfile::tempdir().unwrap();
    let raster = write_uniform_raster(dir.path(), "upsampling.png", 512, 512, [30, 90, 150, 255]);
    write_georef(&raster, 1, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 4).unwrap();
    TilePyramid::open(&raster, store)
        .unwrap()
        .with_max_zoom(3)
        .run()
        .await
        .unwrap();

    let (regular, links) = regular_files_and_links(&output);
    // Zooms 1, 2, 3: 4 + 16 + 64 tiles in total.
    assert_eq!(regular.len() + links.len(), 84);
    assert_eq!(regular.len(), 1);

    let canonical = fs::canonicalize(&regular[0]).unwrap();
    for link in &links {
        assert_eq!(fs::canonicalize(link).unwrap(), canonical);
    }
}

#[tokio::test]
async fn test_one_regular_file_per_hash() {
    let dir = tempfile::tempdir().unwrap();
    let raster = write_uniform_raster(dir.path(), "flat.png", 512, 512, [200, 180, 40, 255]);
    write_georef(&raster, 1, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 4).unwrap();
    TilePyramid::open(&raster, store)
        .unwrap()
        .with_min_zoom(0)
        .run()
        .await
        .unwrap();

    let (regular, links) = regular_files_and_links(&output);
    let mut by_hash: HashMap<PixelHash, Vec<PathBuf>> = HashMap::new();
    for path in &regular {
        by_hash.entry(filename_hash(path)).or_default().push(path.clone());
    }
    for (hash, paths) in &by_hash {
        assert_eq!(paths.len(), 1, "hash {hash} written more than once");
    }

    // Every symlink's hash has a regular file, and the link resolves to it.
    for link in &links {
        let hash = filename_hash(link);
        let target = &by_hash[&hash][0];
        assert_eq!(
            fs::canonicalize(link).unwrap(),
            fs::canonicalize(target).unwrap()
        );
    }
}

#[tokio::test]
async fn test_symlinks_are_relative_and_stay_inside_output() {
    let dir = tempfile::tempdir().unwrap();
    let raster = write_uniform_raster(dir.path(), "flat.png", 512, 512, [5, 5, 5, 255]);
    write_georef(&raster, 1, (0.0, 0.0));
    let output = dir.path().join("tiles");

    let store = TileStore::create(&output, TILE_SIDE, 4).unwrap();
    TilePyramid::open(&raster, store)
        .unwrap()
        .with_min_zoom(0)
        .run()
        .await
        .unwrap();

    let (_, links) = regular_files_and_links(&output);
    assert!(!links.is_empty());

    let root = fs::canonicalize(&output).unwrap();
    for link in &links {
        let target = fs::read_link(link).unwrap();
        assert!(
            target.is_relative(),
            "{} points at absolute {}",
            link.display(),
            target.display()
        );
        let resolved = fs::canonicalize(link.parent().unwrap().join(&target)).unwrap();
        assert!(
            resolved.starts_with(&root),
            "{} escapes the output root",
            resolved.display()
        );
    }
}
