//! Path utilities for rummo data directories and snapshot layout

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::snapshot::{RUMMO_DIR, SNAPSHOT_ROOT_DIR};

/// Global storage for custom data directory path
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the data directory with an optional custom path.
/// Must be called early in main() before any other path functions are used.
/// If custom_path is None, uses the default ~/.rummo location.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(default_data_dir);
    if DATA_DIR.set(path.clone()).is_err() {
        let existing = DATA_DIR
            .get()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::debug!(
            path = %path.display(),
            existing = %existing,
            "Data directory already initialized"
        );
    }
}

/// Get the default data directory path (~/.rummo)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".rummo"))
        .unwrap_or_else(|| PathBuf::from(".rummo"))
}

/// Get the base rummo data directory.
/// Returns the custom path if set via init_data_dir(), otherwise ~/.rummo
pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// Get the logs directory (~/.rummo/logs)
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Get the default log file path (~/.rummo/logs/rummo.log)
pub fn log_file_path() -> PathBuf {
    logs_dir().join("rummo.log")
}

/// Get the config file path (~/.rummo/config.toml)
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Snapshot directory for a notebook: `<notebook_dir>/__marimo__/__rummo__`
pub fn snapshot_dir(notebook_path: &Path) -> PathBuf {
    let parent = notebook_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    parent.join(SNAPSHOT_ROOT_DIR).join(RUMMO_DIR)
}

/// File stem of the notebook, used to name its snapshot and figures
pub fn notebook_stem(notebook_path: &Path) -> String {
    notebook_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notebook".to_string())
}
