use std::path::Path;

use async_trait::async_trait;

use crate::runtime::capture::CaptureBuffers;
use crate::runtime::error::ExecutionError;
use crate::snapshot::CellView;

/// What a successful cell run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    /// Value of the cell's last expression, if the runtime reports one
    pub value: serde_json::Value,
    /// Names the cell defined
    pub defs: Vec<String>,
}

/// Capability to execute a cell. Implemented by the host runtime.
#[async_trait]
pub trait Runnable: Send {
    async fn run(&mut self) -> Result<RunOutcome, ExecutionError>;
}

/// A live cell as the host runtime exposes it
pub trait LiveCell: Runnable {
    /// Opaque runtime-assigned ID: a per-session prefix plus a unique suffix
    fn cell_id(&self) -> &str;

    /// Human-assigned name, unique among live cells
    fn name(&self) -> &str;

    fn cell_type(&self) -> &str {
        "code"
    }

    /// Whether the output is out of date relative to the cell's inputs
    fn is_stale(&self) -> bool;

    /// Last raw output text attached to this cell
    fn raw_output(&self) -> Option<&str>;

    /// Attach raw output text to this cell
    fn set_output(&mut self, output: String);

    fn view(&self) -> CellView {
        CellView {
            full_id: self.cell_id().to_owned(),
            name: self.name().to_owned(),
            stale: self.is_stale(),
            raw_output: self.raw_output().map(str::to_owned),
            cell_type: self.cell_type().to_owned(),
        }
    }
}

/// The host notebook: an ordered set of live cells plus a capture primitive
pub trait NotebookHost: Send {
    /// Path of the notebook file
    fn notebook_path(&self) -> &Path;

    fn cell_count(&self) -> usize;

    fn cell(&self, index: usize) -> Option<&dyn LiveCell>;

    fn cell_mut(&mut self, index: usize) -> Option<&mut dyn LiveCell>;

    /// Route all cell stdout/stderr into `buffers` until [`end_capture`](Self::end_capture)
    fn begin_capture(&mut self, buffers: CaptureBuffers);

    fn end_capture(&mut self);

    /// Current state of every live cell, in host order
    fn cell_views(&self) -> Vec<CellView> {
        (0..self.cell_count())
            .filter_map(|index| self.cell(index))
            .map(|cell| cell.view())
            .collect()
    }
}
