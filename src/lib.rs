pub mod app;
pub mod config;
pub mod driver;
pub mod figures;
pub mod runtime;
pub mod snapshot;
pub mod util;

pub use app::run_once;
pub use config::Config;
pub use driver::{CycleReport, ExecutionDriver, FailurePolicy};
pub use figures::{AdapterContext, FigureCaptureAdapter, FigureLedger};
pub use runtime::{LiveCell, NotebookHost, RunOutcome, Runnable, ScriptNotebook};
pub use snapshot::{
    normalize_output, reconcile, short_id, CellSnapshot, CellView, SnapshotCollection,
    SnapshotStore,
};
