//! Execution capture driver
//!
//! Runs every live cell once, attaches each cell's captured text as its
//! output, then folds the live set into the snapshot collection and
//! persists it.

mod cycle;

pub use cycle::{CellFailure, CycleError, CycleReport, ExecutionDriver};

use serde::Deserialize;

/// How a failing cell affects the rest of a run cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failing cell; later cells are neither run nor updated
    #[default]
    FailFast,
    /// Record the failure on the failing cell and keep running the rest
    Isolate,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "fail-fast",
            FailurePolicy::Isolate => "isolate",
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
