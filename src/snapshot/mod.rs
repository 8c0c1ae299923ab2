//! Cell snapshot model
//!
//! Holds the persisted representation of notebook cells, the engine that
//! keeps it in step with the live cell set, and the on-disk store.

pub mod ids;
pub mod output;
pub mod reconcile;
pub mod record;
pub mod store;

pub use ids::short_id;
pub use output::normalize_output;
pub use reconcile::{reconcile, ReconcileError, ReconcileSummary, SnapshotCollection};
pub use record::{CellSnapshot, CellView};
pub use store::{SnapshotStore, StoreError, RUMMO_DIR, SNAPSHOT_ROOT_DIR};
