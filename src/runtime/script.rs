//! Script notebook host
//!
//! A notebook described by a TOML file whose cells are shell commands:
//!
//! ```toml
//! [[cell]]
//! name = "load"
//! run = "wc -l data.csv"
//!
//! [[cell]]
//! name = "plot"
//! id = "MJUe"
//! run = "python plot.py --out \"$RUMMO_FIGURE_DIR/fig.png\""
//! defines = ["fig"]
//! ```
//!
//! Cell IDs are a per-notebook prefix plus a suffix, so they stay stable
//! across processes and survive renames when `id` is pinned. Unpinned cells
//! take the first 4-character window of their name digest no other cell in
//! the notebook already uses.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use parking_lot::Mutex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tokio::process::Command;

use crate::figures::{
    Figure, FigureCaptureAdapter, FigureError, FigureRenderer, OutputEvent, RuntimeContext,
};
use crate::runtime::capture::{CaptureBuffers, CaptureRoute};
use crate::runtime::error::ExecutionError;
use crate::runtime::runner::{LiveCell, NotebookHost, RunOutcome, Runnable};
use crate::snapshot::ids::SHORT_ID_LEN;

/// Environment variable pointing at a cell's figure scratch directory
pub const FIGURE_DIR_ENV: &str = "RUMMO_FIGURE_DIR";

const SESSION_PREFIX_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to read notebook {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid notebook {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cell {name} has an empty id")]
    EmptyId { name: String },

    #[error("Cells {first} and {second} share the id {id}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Deserialize)]
struct ScriptFile {
    #[serde(default, rename = "cell")]
    cells: Vec<ScriptCellSpec>,
}

#[derive(Debug, Deserialize)]
struct ScriptCellSpec {
    name: String,
    run: String,
    id: Option<String>,
    #[serde(rename = "type", default = "default_cell_type")]
    cell_type: String,
    #[serde(default)]
    defines: Vec<String>,
}

fn default_cell_type() -> String {
    "code".to_string()
}

/// Host application state shared with the figure adapter
#[derive(Debug, Default)]
pub struct ScriptContext {
    current_cell: Mutex<Option<String>>,
    route: CaptureRoute,
}

impl RuntimeContext for ScriptContext {
    fn current_cell_id(&self) -> Option<String> {
        self.current_cell.lock().clone()
    }

    fn broadcast_output(&self, event: OutputEvent) {
        if event.data.is_empty() {
            return;
        }
        self.route.stdout(&format!("{}\n", event.data));
    }
}

/// One shell-command cell
pub struct ScriptCell {
    full_id: String,
    name: String,
    cell_type: String,
    command: String,
    defines: Vec<String>,
    stale: bool,
    output: Option<String>,
    workdir: PathBuf,
    context: Arc<ScriptContext>,
    figures: Option<CellFigures>,
}

struct CellFigures {
    adapter: Arc<FigureCaptureAdapter>,
    scratch: PathBuf,
}

impl ScriptCell {
    pub fn command(&self) -> &str {
        &self.command
    }

    async fn execute(&mut self) -> Result<std::process::Output, ExecutionError> {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.workdir)
            .env("RUMMO_CELL_ID", &self.full_id)
            .env("RUMMO_CELL_NAME", &self.name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(figures) = &self.figures {
            fs::create_dir_all(&figures.scratch).map_err(|e| ExecutionError::Spawn {
                cell: self.name.clone(),
                message: e.to_string(),
            })?;
            command.env(FIGURE_DIR_ENV, &figures.scratch);
        }

        command.output().await.map_err(|e| ExecutionError::Spawn {
            cell: self.name.clone(),
            message: e.to_string(),
        })
    }

    fn show_figures(&self) -> Result<(), ExecutionError> {
        let Some(figures) = &self.figures else {
            return Ok(());
        };
        let mut renderer = ScratchFigures::scan(&figures.scratch);
        if renderer.figures.is_empty() {
            return Ok(());
        }
        figures
            .adapter
            .show(&mut renderer)
            .map(|_| ())
            .map_err(|e| ExecutionError::Render {
                cell: self.name.clone(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Runnable for ScriptCell {
    async fn run(&mut self) -> Result<RunOutcome, ExecutionError> {
        *self.context.current_cell.lock() = Some(self.full_id.clone());
        let result = self.execute().await;

        let result = result.and_then(|output| {
            self.context.route.stdout(&String::from_utf8_lossy(&output.stdout));
            self.context.route.stderr(&String::from_utf8_lossy(&output.stderr));
            let shown = self.show_figures();
            if !output.status.success() {
                return Err(ExecutionError::ExitStatus {
                    cell: self.name.clone(),
                    code: output.status.code(),
                });
            }
            shown.map(|()| RunOutcome {
                value: serde_json::json!(output.status.code()),
                defs: self.defines.clone(),
            })
        });
        *self.context.current_cell.lock() = None;

        self.stale = result.is_err();
        result
    }
}

impl LiveCell for ScriptCell {
    fn cell_id(&self) -> &str {
        &self.full_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn cell_type(&self) -> &str {
        &self.cell_type
    }

    fn is_stale(&self) -> bool {
        self.stale
    }

    fn raw_output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    fn set_output(&mut self, output: String) {
        self.output = Some(output);
    }
}

/// Notebook host backed by a TOML file of shell-command cells
pub struct ScriptNotebook {
    path: PathBuf,
    cells: Vec<ScriptCell>,
    context: Arc<ScriptContext>,
    scratch_root: Option<TempDir>,
}

impl ScriptNotebook {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    /// Build a notebook from TOML `contents` as if it were read from `path`
    pub fn parse(path: &Path, contents: &str) -> Result<Self, ScriptError> {
        let file: ScriptFile = toml::from_str(contents).map_err(|source| ScriptError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let prefix = session_prefix(path);
        let workdir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let context = Arc::new(ScriptContext::default());

        // Pinned ids are claimed first so generated suffixes steer around them.
        let mut taken: HashMap<String, String> = HashMap::new();
        for spec in &file.cells {
            match &spec.id {
                Some(id) if id.is_empty() => {
                    return Err(ScriptError::EmptyId {
                        name: spec.name.clone(),
                    });
                }
                Some(id) => claim(&mut taken, id, &spec.name)?,
                None => {}
            }
        }

        let cells = file
            .cells
            .into_iter()
            .map(|spec| {
                let suffix = match spec.id {
                    Some(id) => id,
                    None => name_suffix(&spec.name, &mut taken)?,
                };
                Ok(ScriptCell {
                    full_id: format!("{prefix}{suffix}"),
                    name: spec.name,
                    cell_type: spec.cell_type,
                    command: spec.run,
                    defines: spec.defines,
                    stale: true,
                    output: None,
                    workdir: workdir.clone(),
                    context: context.clone(),
                    figures: None,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(path = %path.display(), cells = cells.len(), "Loaded script notebook");

        Ok(Self {
            path: path.to_path_buf(),
            cells,
            context,
            scratch_root: None,
        })
    }

    /// Host state the figure adapter reports to
    pub fn runtime_context(&self) -> Arc<ScriptContext> {
        self.context.clone()
    }

    /// Route every cell's figures through `adapter`.
    ///
    /// Each cell gets a scratch directory exported as `RUMMO_FIGURE_DIR`;
    /// images written there are saved by the adapter after the cell runs.
    pub fn install_figure_adapter(&mut self, adapter: FigureCaptureAdapter) -> std::io::Result<()> {
        let root = tempfile::Builder::new().prefix("rummo-figures").tempdir()?;
        let adapter = Arc::new(adapter);
        for (index, cell) in self.cells.iter_mut().enumerate() {
            cell.figures = Some(CellFigures {
                adapter: adapter.clone(),
                scratch: root.path().join(format!("cell-{index}")),
            });
        }
        self.scratch_root = Some(root);
        Ok(())
    }

    pub fn cells(&self) -> &[ScriptCell] {
        &self.cells
    }
}

impl NotebookHost for ScriptNotebook {
    fn notebook_path(&self) -> &Path {
        &self.path
    }

    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, index: usize) -> Option<&dyn LiveCell> {
        self.cells.get(index).map(|c| c as &dyn LiveCell)
    }

    fn cell_mut(&mut self, index: usize) -> Option<&mut dyn LiveCell> {
        self.cells.get_mut(index).map(|c| c as &mut dyn LiveCell)
    }

    fn begin_capture(&mut self, buffers: CaptureBuffers) {
        self.context.route.install(buffers);
    }

    fn end_capture(&mut self) {
        self.context.route.release();
    }
}

/// Images a cell left in its scratch directory, in file-name order
struct ScratchFigures {
    figures: Vec<FileFigure>,
}

impl ScratchFigures {
    fn scan(dir: &Path) -> Self {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.is_file() && image::ImageFormat::from_path(path).is_ok())
                    .collect()
            })
            .unwrap_or_default();
        paths.sort();
        Self {
            figures: paths.into_iter().map(|path| FileFigure { path }).collect(),
        }
    }
}

impl FigureRenderer for ScratchFigures {
    fn pending_figures(&self) -> Vec<&dyn Figure> {
        self.figures.iter().map(|f| f as &dyn Figure).collect()
    }

    fn complete_show(&mut self) {
        for figure in self.figures.drain(..) {
            if let Err(e) = fs::remove_file(&figure.path) {
                tracing::debug!(path = %figure.path.display(), error = %e, "Failed to remove scratch figure");
            }
        }
    }
}

struct FileFigure {
    path: PathBuf,
}

impl Figure for FileFigure {
    fn rasterize(&self) -> Result<DynamicImage, FigureError> {
        image::open(&self.path).map_err(|source| FigureError::Decode {
            path: self.path.clone(),
            source,
        })
    }
}

fn hex_digest(input: &[u8]) -> String {
    format!("{:x}", Sha256::digest(input))
}

/// Per-notebook ID prefix shared by all of its cells
fn session_prefix(path: &Path) -> String {
    let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut digest = hex_digest(canonical.to_string_lossy().as_bytes());
    digest.truncate(SESSION_PREFIX_LEN);
    digest
}

/// Default cell suffix derived from the cell name
fn name_suffix(name: &str, taken: &mut HashMap<String, String>) -> Result<String, ScriptError> {
    let digest = hex_digest(name.as_bytes());
    let windows = digest.len() / SHORT_ID_LEN;
    for start in (0..windows).map(|w| w * SHORT_ID_LEN) {
        let candidate = &digest[start..start + SHORT_ID_LEN];
        if !taken.contains_key(candidate) {
            taken.insert(candidate.to_string(), name.to_string());
            return Ok(candidate.to_string());
        }
    }
    // Every window is in use; report the owner of the preferred one.
    let preferred = &digest[..SHORT_ID_LEN];
    Err(ScriptError::DuplicateId {
        id: preferred.to_string(),
        first: taken.get(preferred).cloned().unwrap_or_default(),
        second: name.to_string(),
    })
}

fn claim(taken: &mut HashMap<String, String>, id: &str, name: &str) -> Result<(), ScriptError> {
    if let Some(first) = taken.get(id) {
        return Err(ScriptError::DuplicateId {
            id: id.to_string(),
            first: first.clone(),
            second: name.to_string(),
        });
    }
    taken.insert(id.to_string(), name.to_string());
    Ok(())
}
