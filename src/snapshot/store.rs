//! On-disk snapshot document
//!
//! One JSON document per notebook at
//! `<notebook_dir>/__marimo__/__rummo__/<stem>.json`, keyed by cell name and
//! laid out in notebook order. Writes go through a temporary file in the
//! same directory and an atomic rename, so readers never observe a partial
//! document.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use serde::{Serialize, Serializer};
use tempfile::NamedTempFile;

use super::reconcile::SnapshotCollection;
use super::record::CellSnapshot;
use crate::util::paths::{notebook_stem, snapshot_dir};

/// Directory created next to the notebook
pub const SNAPSHOT_ROOT_DIR: &str = "__marimo__";
/// Subdirectory holding snapshot documents and figure files
pub const RUMMO_DIR: &str = "__rummo__";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Invalid snapshot document {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Snapshot document and figure directory for one notebook.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    notebook_stem: String,
    dir: PathBuf,
    file: PathBuf,
}

impl SnapshotStore {
    /// Open the store for `notebook_path`, creating the snapshot directory
    /// and an empty document on first access.
    pub fn open(notebook_path: &Path) -> Result<Self, StoreError> {
        let dir = snapshot_dir(notebook_path);
        let stem = notebook_stem(notebook_path);
        let file = dir.join(format!("{stem}.json"));

        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        if !file.exists() {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file)
                .map_err(|source| StoreError::Io {
                    path: file.clone(),
                    source,
                })?;
            tracing::debug!(path = %file.display(), "Created empty snapshot document");
        }

        Ok(Self {
            notebook_stem: stem,
            dir,
            file,
        })
    }

    pub fn notebook_stem(&self) -> &str {
        &self.notebook_stem
    }

    /// Directory holding the document and figure files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot document
    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Path for the `n`th (1-based) figure a cell produced in one render call
    pub fn figure_path(&self, short_id: &str, n: usize, format: ImageFormat) -> PathBuf {
        figure_path(&self.dir, &self.notebook_stem, short_id, n, format)
    }

    /// Read the persisted collection. An empty document is an empty collection.
    pub fn load(&self) -> Result<SnapshotCollection, StoreError> {
        let contents = fs::read_to_string(&self.file).map_err(|source| StoreError::Io {
            path: self.file.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(SnapshotCollection::new());
        }

        let cells: HashMap<String, CellSnapshot> =
            serde_json::from_str(&contents).map_err(|source| StoreError::Json {
                path: self.file.clone(),
                source,
            })?;

        // Entries whose key matches their name go last so they win a name clash.
        let mut entries: Vec<(String, CellSnapshot)> = cells.into_iter().collect();
        entries.sort_by(|(a, cell_a), (b, cell_b)| {
            (*a == cell_a.name, a.as_str()).cmp(&(*b == cell_b.name, b.as_str()))
        });

        let mut collection = SnapshotCollection::new();
        for (key, cell) in entries {
            if key != cell.name {
                tracing::warn!(key = %key, name = %cell.name, "Snapshot key does not match cell name, using name");
            }
            if let Some(dropped) = collection.insert(cell) {
                tracing::warn!(
                    name = %dropped.name,
                    cell_id = %dropped.full_id(),
                    "Snapshot has two entries with the same name, dropping one"
                );
            }
        }
        Ok(collection)
    }

    /// Overwrite the document with `collection`, ordered by `cell_index`.
    pub fn write(&self, collection: &SnapshotCollection) -> Result<(), StoreError> {
        let contents = to_document(collection).map_err(|source| StoreError::Json {
            path: self.file.clone(),
            source,
        })?;

        let io_err = |source: io::Error| StoreError::Io {
            path: self.file.clone(),
            source,
        };
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        temp.write_all(contents.as_bytes()).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(&self.file).map_err(|err| io_err(err.error))?;

        tracing::debug!(
            path = %self.file.display(),
            cells = collection.len(),
            "Wrote snapshot document"
        );
        Ok(())
    }
}

/// Build `<dir>/<stem>_<short_id>_fig-<n>.<ext>`.
pub fn figure_path(
    dir: &Path,
    notebook_stem: &str,
    short_id: &str,
    n: usize,
    format: ImageFormat,
) -> PathBuf {
    let ext = format.extensions_str().first().copied().unwrap_or("png");
    dir.join(format!("{notebook_stem}_{short_id}_fig-{n}.{ext}"))
}

/// Render the collection as a pretty-printed JSON object keyed by name.
pub fn to_document(collection: &SnapshotCollection) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&OrderedDocument(collection.ordered()))
}

struct OrderedDocument<'a>(Vec<(&'a str, &'a CellSnapshot)>);

impl Serialize for OrderedDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().copied())
    }
}
