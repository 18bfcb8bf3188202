//! The content-addressed tile writer.
//!
//! `TileStore` owns the run's worker pool and the hash index. `save`
//! enqueues one tile; a bounded semaphore applies backpressure when the
//! queue is full; `wait_all` drains the pool and surfaces the first
//! failure. For any given pixel hash exactly one PNG is encoded and
//! written per process: the index maps each hash to a completion cell that
//! resolves to the first file's path once the bytes are durable, and every
//! later submission with that hash waits on the cell and links to it.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{OnceCell, Semaphore};
use tokio::task::JoinSet;
use tracing::trace;

use crate::error::StorageError;
use crate::grid::TileCoord;
use crate::raster::Raster;

use super::hash::PixelHash;

/// Queue slots per worker before `save` starts blocking.
pub const DEFAULT_QUEUE_FACTOR: usize = 2;

type HashIndex = Mutex<HashMap<PixelHash, Arc<OnceCell<PathBuf>>>>;

/// Content-addressed writer for one pyramid run.
pub struct TileStore {
    root: PathBuf,
    empty_tile: Raster,
    index: Arc<HashIndex>,
    limiter: Arc<Semaphore>,
    tasks: tokio::sync::Mutex<JoinSet<Result<(), StorageError>>>,
}

impl TileStore {
    /// Create the output root and an idle worker pool.
    ///
    /// `workers` bounds how many tiles hash/encode/write concurrently;
    /// the submission queue holds `workers * DEFAULT_QUEUE_FACTOR` entries
    /// before `save` blocks.
    pub fn create(
        root: impl Into<PathBuf>,
        tile_side: u32,
        workers: usize,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::Io {
            path: root.clone(),
            source: e,
        })?;
        let workers = workers.max(1);
        Ok(Self {
            empty_tile: Raster::new_rgba(tile_side, tile_side),
            index: Arc::new(Mutex::new(HashMap::new())),
            limiter: Arc::new(Semaphore::new(workers * DEFAULT_QUEUE_FACTOR)),
            tasks: tokio::sync::Mutex::new(JoinSet::new()),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Submit one tile for persistence.
    ///
    /// Returns once the tile is enqueued, which may block while the queue
    /// is full. Durability is only guaranteed after [`wait_all`].
    ///
    /// [`wait_all`]: TileStore::wait_all
    pub async fn save(&self, coord: TileCoord, image: Raster) -> Result<(), StorageError> {
        let permit = Arc::clone(&self.limiter)
            .acquire_owned()
            .await
            .map_err(|e| StorageError::Worker(e.to_string()))?;

        let root = self.root.clone();
        let index = Arc::clone(&self.index);

        let mut tasks = self.tasks.lock().await;
        tasks.spawn(async move {
            let _permit = permit;
            write_tile(&root, &index, coord, image).await
        });
        Ok(())
    }

    /// Submit the canonical transparent tile for a border coordinate.
    ///
    /// All border tiles share one pixel hash, so across every zoom of a
    /// run they collapse onto a single regular file.
    pub async fn save_border(&self, coord: TileCoord) -> Result<(), StorageError> {
        self.save(coord, self.empty_tile.clone()).await
    }

    /// Block until every submitted tile is durable on disk.
    ///
    /// Surfaces the first worker failure and shuts the pool down; the run
    /// is aborted, partial output is left behind.
    pub async fn wait_all(&self) -> Result<(), StorageError> {
        let mut tasks = self.tasks.lock().await;
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    tasks.shutdown().await;
                    return Err(StorageError::Worker(e.to_string()));
                }
            };
            if let Err(e) = result {
                tasks.shutdown().await;
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Hash, then write-or-link, one tile.
async fn write_tile(
    root: &Path,
    index: &HashIndex,
    coord: TileCoord,
    image: Raster,
) -> Result<(), StorageError> {
    let (hash, image) = tokio::task::spawn_blocking(move || {
        let hash = PixelHash::of_pixels(image.pixel_bytes());
        (hash, image)
    })
    .await
    .map_err(|e| StorageError::Worker(e.to_string()))?;

    let path = root
        .join(coord.z.to_string())
        .join(format!("{}-{}-{}.png", coord.x, coord.y, hash));

    let cell = {
        let mut index = index
            .lock()
            .map_err(|e| StorageError::Worker(e.to_string()))?;
        Arc::clone(index.entry(hash).or_default())
    };

    // The first submission for this hash runs the encode-and-write; the
    // cell resolves only after the file is on disk, so a concurrent
    // duplicate cannot link to a path that does not exist yet.
    let first_path = path.clone();
    let canonical = cell
        .get_or_try_init(|| async {
            tokio::task::spawn_blocking(move || {
                let bytes = image.encode_png()?;
                write_atomic(&first_path, &bytes)?;
                Ok::<_, StorageError>(first_path)
            })
            .await
            .map_err(|e| StorageError::Worker(e.to_string()))?
        })
        .await?;

    if canonical != &path {
        link_duplicate(canonical, &path)?;
        trace!(tile = %coord, target = %canonical.display(), "linked duplicate tile");
    } else {
        trace!(tile = %coord, "wrote tile");
    }
    Ok(())
}

/// Write `bytes` to `path` via a temp file in the same directory, so a
/// crash never leaves a half-written tile under the final name.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| StorageError::Io {
        path: parent.to_path_buf(),
        source: e,
    })?;

    let io_err = |e| StorageError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Create `link` pointing at `target`, preferring a relative symlink so
/// the output tree stays relocatable.
fn link_duplicate(target: &Path, link: &Path) -> Result<(), StorageError> {
    let link_dir = link.parent().unwrap_or_else(|| Path::new("."));
    let relative = relative_path(link_dir, target);

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&relative, link).map_err(|e| StorageError::Io {
            path: link.to_path_buf(),
            source: e,
        })
    }
    #[cfg(not(unix))]
    {
        let _ = relative;
        // No symlinks here: a hard link still deduplicates on disk, a
        // plain copy at least keeps the layout correct.
        fs::hard_link(target, link)
            .or_else(|_| fs::copy(target, link).map(|_| ()))
            .map_err(|e| StorageError::Io {
                path: link.to_path_buf(),
                source: e,
            })
    }
}

/// The path of `to` relative to the directory `from_dir`. Both sides live
/// under the same output root, so walking up with `..` is always enough.
fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let mut from = from_dir.components().peekable();
    let mut to = to.components().peekable();
    while let (Some(a), Some(b)) = (from.peek(), to.peek()) {
        if a != b {
            break;
        }
        from.next();
        to.next();
    }

    let mut relative = PathBuf::new();
    for _ in from {
        relative.push("..");
    }
    for component in to {
        relative.push(component.as_os_str());
    }
    relative
}

// =============================================================================
// Tests
// =============================================================================
