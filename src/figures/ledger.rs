use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Figure paths saved per cell since the driver last collected them
#[derive(Debug, Clone, Default)]
pub struct FigureLedger {
    entries: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl FigureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append paths saved for `cell_id`
    pub fn record(&self, cell_id: &str, paths: impl IntoIterator<Item = String>) {
        self.entries
            .lock()
            .entry(cell_id.to_owned())
            .or_default()
            .extend(paths);
    }

    /// Remove and return everything recorded for `cell_id`
    pub fn take(&self, cell_id: &str) -> Vec<String> {
        self.entries.lock().remove(cell_id).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
