//! Figure capture
//!
//! An adapter that stands in for the host's rendering backend: on every
//! "render now" call it saves the pending figures next to the snapshot
//! document and reports their paths as the current cell's output.

pub mod adapter;
pub mod backend;
pub mod ledger;

pub use adapter::{AdapterContext, FigureCaptureAdapter};
pub use backend::{
    CellChannel, Figure, FigureError, FigureRenderer, OutputEvent, RuntimeContext, TEXT_PLAIN,
};
pub use ledger::FigureLedger;
