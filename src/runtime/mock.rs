//! Mock notebook host for deterministic testing
//!
//! Implements [`NotebookHost`] with in-memory cells whose behavior is
//! configured up front, so the driver can be exercised without a real
//! runtime.
//!
//! # Example
//! ```no_run
//! use rummo::runtime::mock::{MockCell, MockNotebook};
//!
//! let notebook = MockNotebook::new("/tmp/nb.py")
//!     .with_cell(MockCell::new("sessHbol", "load").printing("rows: 3\n"))
//!     .with_cell(MockCell::new("sessMJUe", "fit").failing("ValueError: bad\n"));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::runtime::capture::{CaptureBuffers, CaptureRoute};
use crate::runtime::error::ExecutionError;
use crate::runtime::runner::{LiveCell, NotebookHost, RunOutcome, Runnable};

type Hook = Arc<dyn Fn(&CaptureRoute) -> Result<(), String> + Send + Sync>;

/// What a mock cell does when run
#[derive(Clone, Default)]
pub enum MockBehavior {
    /// Succeed without writing anything
    #[default]
    Silent,
    /// Write text to stdout and succeed
    Print(String),
    /// Write text to stderr and fail
    Fail { stderr: String },
    /// Run arbitrary code against the capture route
    Custom(Hook),
}

impl fmt::Debug for MockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockBehavior::Silent => write!(f, "Silent"),
            MockBehavior::Print(text) => f.debug_tuple("Print").field(text).finish(),
            MockBehavior::Fail { stderr } => {
                f.debug_struct("Fail").field("stderr", stderr).finish()
            }
            MockBehavior::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// In-memory live cell
#[derive(Debug, Clone)]
pub struct MockCell {
    pub id: String,
    pub name: String,
    pub cell_type: String,
    pub stale: bool,
    pub output: Option<String>,
    pub behavior: MockBehavior,
    /// Number of times run() was called
    pub run_count: usize,
    route: CaptureRoute,
}

impl MockCell {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cell_type: "code".to_string(),
            stale: true,
            output: None,
            behavior: MockBehavior::Silent,
            run_count: 0,
            route: CaptureRoute::new(),
        }
    }

    pub fn printing(mut self, text: impl Into<String>) -> Self {
        self.behavior = MockBehavior::Print(text.into());
        self
    }

    pub fn failing(mut self, stderr: impl Into<String>) -> Self {
        self.behavior = MockBehavior::Fail {
            stderr: stderr.into(),
        };
        self
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CaptureRoute) -> Result<(), String> + Send + Sync + 'static,
    {
        self.behavior = MockBehavior::Custom(Arc::new(hook));
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_type(mut self, cell_type: impl Into<String>) -> Self {
        self.cell_type = cell_type.into();
        self
    }
}

#[async_trait]
impl Runnable for MockCell {
    async fn run(&mut self) -> Result<RunOutcome, ExecutionError> {
        self.run_count += 1;
        let result = match &self.behavior {
            MockBehavior::Silent => Ok(()),
            MockBehavior::Print(text) => {
                self.route.stdout(text);
                Ok(())
            }
            MockBehavior::Fail { stderr } => {
                self.route.stderr(stderr);
                Err(stderr.trim().to_string())
            }
            MockBehavior::Custom(hook) => hook(&self.route),
        };

        match result {
            Ok(()) => {
                self.stale = false;
                Ok(RunOutcome::default())
            }
            Err(message) => {
                self.stale = true;
                Err(ExecutionError::Raised {
                    cell: self.name.clone(),
                    message,
                })
            }
        }
    }
}

impl LiveCell for MockCell {
    fn cell_id(&self) -> &str {
        &self.id
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

/// In-memory notebook host
#[derive(Debug, Clone)]
pub struct MockNotebook {
    path: PathBuf,
    cells: Vec<MockCell>,
    route: CaptureRoute,
    /// Whether a capture is currently open
    capturing: bool,
    /// Number of begin_capture() calls
    pub capture_count: usize,
}

impl MockNotebook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cells: Vec::new(),
            route: CaptureRoute::new(),
            capturing: false,
            capture_count: 0,
        }
    }

    pub fn with_cell(mut self, cell: MockCell) -> Self {
        self.push(cell);
        self
    }

    pub fn push(&mut self, mut cell: MockCell) {
        cell.route = self.route.clone();
        self.cells.push(cell);
    }

    pub fn remove(&mut self, name: &str) -> Option<MockCell> {
        let index = self.cells.iter().position(|c| c.name == name)?;
        Some(self.cells.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&MockCell> {
        self.cells.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MockCell> {
        self.cells.iter_mut().find(|c| c.name == name)
    }

    pub fn cells(&self) -> &[MockCell] {
        &self.cells
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }
}

impl NotebookHost for MockNotebook {
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
        self.capture_count += 1;
        self.capturing = true;
        self.route.install(buffers);
    }

    fn end_capture(&mut self) {
        self.capturing = false;
        self.route.release();
    }
}
