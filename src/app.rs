//! One-shot run of a script notebook, as the CLI performs it

use std::path::Path;

use crate::config::Config;
use crate::driver::{CycleReport, ExecutionDriver};
use crate::figures::{AdapterContext, FigureCaptureAdapter, FigureLedger};
use crate::runtime::{NotebookHost, ScriptNotebook};
use crate::snapshot::SnapshotStore;

/// Load the notebook, run one cycle and persist its snapshot.
pub async fn run_once(notebook: &Path, config: &Config) -> anyhow::Result<CycleReport> {
    let mut host = ScriptNotebook::load(notebook)?;
    let store = SnapshotStore::open(host.notebook_path())?;
    let mut driver = ExecutionDriver::resume(store.clone())?.with_policy(config.failure_policy);

    if config.figures.enabled {
        let ledger = FigureLedger::new();
        let context = AdapterContext::new(
            host.runtime_context(),
            &store,
            config.figures.format,
            ledger.clone(),
        );
        host.install_figure_adapter(FigureCaptureAdapter::new(context))?;
        driver = driver.with_figure_ledger(ledger);
        tracing::debug!(format = ?config.figures.format, "Figure capture enabled");
    }

    let report = driver.run_cycle(&mut host).await?;
    Ok(report)
}
