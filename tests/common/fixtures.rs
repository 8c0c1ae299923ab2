//! Notebook and figure fixtures

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use rummo::snapshot::CellView;
use tempfile::TempDir;

/// Write a script notebook into `dir` and return its path
pub fn write_notebook(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("nb.toml");
    fs::write(&path, contents).expect("Failed to write notebook fixture");
    path
}

/// Write a small solid-color PNG to `path`
pub fn write_png(path: &Path) {
    RgbImage::from_pixel(6, 4, Rgb([200, 30, 30]))
        .save(path)
        .expect("Failed to write PNG fixture");
}

/// Live cell state with plain-text output
pub fn live(full_id: &str, name: &str, output: &str) -> CellView {
    CellView {
        full_id: full_id.to_string(),
        name: name.to_string(),
        stale: false,
        raw_output: Some(output.to_string()),
        cell_type: "code".to_string(),
    }
}

/// Snapshot directory next to a notebook in `dir`
pub fn snapshot_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("__marimo__").join("__rummo__")
}
