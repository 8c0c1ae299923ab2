//! Host notebook runtime contract
//!
//! The runtime owns the live cells and knows how to run them. rummo only
//! sees cells through [`LiveCell`] and the notebook through [`NotebookHost`].

pub mod capture;
pub mod error;
pub mod mock;
pub mod runner;
pub mod script;

pub use capture::{CaptureBuffers, CaptureRoute};
pub use error::ExecutionError;
pub use runner::{LiveCell, NotebookHost, RunOutcome, Runnable};
pub use script::{ScriptError, ScriptNotebook};
