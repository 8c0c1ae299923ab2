//! Reconciliation of the snapshot collection with the live cell set
//!
//! Records are matched to live cells by `full_id`, never by name, so a cell
//! renamed in place keeps its record (and its figures) under the new name.

use std::collections::{HashMap, HashSet};

use super::record::{CellSnapshot, CellView};

/// Name-indexed collection of cell snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotCollection {
    cells: HashMap<String, CellSnapshot>,
}

impl SnapshotCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CellSnapshot> {
        self.cells.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CellSnapshot> {
        self.cells.get_mut(name)
    }

    /// Find a record by its authoritative full ID
    pub fn find_by_id_mut(&mut self, full_id: &str) -> Option<&mut CellSnapshot> {
        self.cells.values_mut().find(|cell| cell.full_id() == full_id)
    }

    /// Insert a record under its own name, returning any record it replaced
    pub fn insert(&mut self, cell: CellSnapshot) -> Option<CellSnapshot> {
        self.cells.insert(cell.name.clone(), cell)
    }

    pub fn remove(&mut self, name: &str) -> Option<CellSnapshot> {
        self.cells.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellSnapshot)> {
        self.cells.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    /// Records in notebook order: ascending `cell_index`, ties broken by name.
    pub fn ordered(&self) -> Vec<(&str, &CellSnapshot)> {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_by(|(a_name, a), (b_name, b)| {
            a.cell_index
                .cmp(&b.cell_index)
                .then_with(|| a_name.cmp(b_name))
        });
        cells
    }
}

impl FromIterator<CellSnapshot> for SnapshotCollection {
    fn from_iter<I: IntoIterator<Item = CellSnapshot>>(iter: I) -> Self {
        let mut collection = Self::new();
        for cell in iter {
            collection.insert(cell);
        }
        collection
    }
}

/// Counts of what a reconciliation pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Live cell sets that cannot be folded into a name-keyed collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("Duplicate live cell name: {name}")]
    DuplicateName { name: String },

    #[error("Duplicate live cell id: {full_id}")]
    DuplicateId { full_id: String },
}

/// Bring `collection` into agreement with the `live` cells.
///
/// Each live cell's `cell_index` is its position in `live`. Live IDs already
/// in the collection are updated in place, new IDs get fresh records, and
/// records whose ID is no longer live are dropped. The outcome does not
/// depend on the order records were inserted into the collection.
///
/// The live set is validated first; on error the collection is untouched.
pub fn reconcile(
    collection: &mut SnapshotCollection,
    live: &[CellView],
) -> Result<ReconcileSummary, ReconcileError> {
    validate_live(live)?;

    let mut summary = ReconcileSummary::default();

    // Reverse index: full_id -> existing record. Ties on a duplicated stored
    // ID keep the earliest record in notebook order.
    let mut previous: Vec<CellSnapshot> = std::mem::take(&mut collection.cells)
        .into_values()
        .collect();
    previous.sort_by(|a, b| {
        a.cell_index
            .cmp(&b.cell_index)
            .then_with(|| a.name.cmp(&b.name))
    });
    let mut by_id: HashMap<String, CellSnapshot> = HashMap::with_capacity(previous.len());
    for cell in previous {
        if by_id.contains_key(cell.full_id()) {
            tracing::debug!(cell = %cell.name, id = %cell.full_id(), "Dropping duplicate stored record");
            summary.deleted += 1;
            continue;
        }
        by_id.insert(cell.full_id().to_owned(), cell);
    }

    let mut cells = HashMap::with_capacity(live.len());
    for (cell_index, view) in live.iter().enumerate() {
        let cell = match by_id.remove(&view.full_id) {
            Some(mut existing) => {
                if existing.name != view.name {
                    tracing::debug!(old = %existing.name, new = %view.name, "Cell renamed");
                }
                existing.apply_view(view, cell_index);
                summary.updated += 1;
                existing
            }
            None => {
                summary.created += 1;
                CellSnapshot::from_view(view, cell_index)
            }
        };
        cells.insert(view.name.clone(), cell);
    }

    for cell in by_id.values() {
        tracing::debug!(cell = %cell.name, id = %cell.full_id(), "Removing record for deleted cell");
    }
    summary.deleted += by_id.len();

    collection.cells = cells;
    Ok(summary)
}

fn validate_live(live: &[CellView]) -> Result<(), ReconcileError> {
    let mut names = HashSet::with_capacity(live.len());
    let mut ids = HashSet::with_capacity(live.len());
    for view in live {
        if !names.insert(view.name.as_str()) {
            return Err(ReconcileError::DuplicateName {
                name: view.name.clone(),
            });
        }
        if !ids.insert(view.full_id.as_str()) {
            return Err(ReconcileError::DuplicateId {
                full_id: view.full_id.clone(),
            });
        }
    }
    Ok(())
}
