use std::collections::HashMap;
use std::path::PathBuf;

use crate::driver::FailurePolicy;
use crate::figures::FigureLedger;
use crate::runtime::{CaptureBuffers, ExecutionError, LiveCell, NotebookHost, Runnable};
use crate::snapshot::{
    reconcile, ReconcileError, ReconcileSummary, SnapshotCollection, SnapshotStore, StoreError,
};

/// A cell whose run operation failed during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFailure {
    pub name: String,
    pub full_id: String,
    pub error: ExecutionError,
}

/// Outcome of one run cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Names of cells whose run operation was invoked, in order
    pub executed: Vec<String>,
    pub failures: Vec<CellFailure>,
    /// Whether a failure stopped the loop before every cell ran
    pub aborted: bool,
    pub summary: ReconcileSummary,
    pub snapshot_path: PathBuf,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owns the snapshot collection and drives run cycles against a host.
#[derive(Debug)]
pub struct ExecutionDriver {
    store: SnapshotStore,
    collection: SnapshotCollection,
    policy: FailurePolicy,
    ledger: Option<FigureLedger>,
}

impl ExecutionDriver {
    /// Start with an empty collection
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            collection: SnapshotCollection::new(),
            policy: FailurePolicy::default(),
            ledger: None,
        }
    }

    /// Start from the collection already persisted in `store`.
    ///
    /// An unreadable document is replaced on the next write, so it only
    /// costs the previous records.
    pub fn resume(store: SnapshotStore) -> Result<Self, StoreError> {
        let collection = match store.load() {
            Ok(collection) => collection,
            Err(e @ StoreError::Json { .. }) => {
                tracing::warn!(error = %e, "Discarding unreadable snapshot document");
                SnapshotCollection::new()
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            collection,
            ..Self::new(store)
        })
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Take figure paths from `ledger` into each executed cell's `img_files`
    pub fn with_figure_ledger(mut self, ledger: FigureLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn collection(&self) -> &SnapshotCollection {
        &self.collection
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run every live cell in host order, then reconcile and persist.
    ///
    /// A successful cell's stdout becomes its output. A failing cell gets
    /// its stderr (or the error text when stderr is empty). Both streams are
    /// drained after every cell. Under [`FailurePolicy::FailFast`] the loop
    /// stops at the first failure and later cells keep their previous
    /// output. Reconciliation and persistence happen either way.
    pub async fn run_cycle<H>(&mut self, host: &mut H) -> Result<CycleReport, CycleError>
    where
        H: NotebookHost + ?Sized,
    {
        let buffers = CaptureBuffers::new();
        let mut executed = Vec::new();
        let mut failures = Vec::new();
        let mut figures: HashMap<String, Vec<String>> = HashMap::new();
        let mut aborted = false;

        host.begin_capture(buffers.clone());
        let cell_count = host.cell_count();
        for index in 0..cell_count {
            let Some(cell) = host.cell_mut(index) else {
                continue;
            };
            let name = cell.name().to_owned();
            let full_id = cell.cell_id().to_owned();
            tracing::debug!(cell = %name, index, "Running cell");

            let failed = match cell.run().await {
                Ok(_) => {
                    cell.set_output(buffers.take_stdout());
                    false
                }
                Err(error) => {
                    let mut text = buffers.take_stderr();
                    if text.trim().is_empty() {
                        text = error.to_string();
                    }
                    cell.set_output(text);
                    tracing::warn!(cell = %name, error = %error, "Cell failed");
                    failures.push(CellFailure {
                        name: name.clone(),
                        full_id: full_id.clone(),
                        error,
                    });
                    true
                }
            };
            buffers.clear();

            if let Some(ledger) = &self.ledger {
                figures.insert(full_id, ledger.take(cell.cell_id()));
            }
            executed.push(name);

            if failed && self.policy == FailurePolicy::FailFast {
                aborted = index + 1 < cell_count;
                break;
            }
        }
        host.end_capture();

        let views = host.cell_views();
        let summary = reconcile(&mut self.collection, &views)?;
        for (full_id, paths) in figures {
            if let Some(record) = self.collection.find_by_id_mut(&full_id) {
                record.img_files = paths;
            }
        }
        self.store.write(&self.collection)?;

        tracing::info!(
            executed = executed.len(),
            failed = failures.len(),
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            policy = %self.policy,
            "Run cycle complete"
        );

        Ok(CycleReport {
            executed,
            failures,
            aborted,
            summary,
            snapshot_path: self.store.path().to_path_buf(),
        })
    }
}
