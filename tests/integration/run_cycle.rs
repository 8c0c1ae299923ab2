//! Integration tests for the run cycle
//!
//! Tests the flow: MockNotebook -> ExecutionDriver -> reconciliation ->
//! persisted snapshot document.

use std::fs;

use rummo::runtime::mock::{MockCell, MockNotebook};
use rummo::snapshot::{reconcile, CellSnapshot, SnapshotCollection, SnapshotStore};
use rummo::ExecutionDriver;
use serde_json::Value;
use tempfile::TempDir;

use super::common::fixtures::live;

fn keys_in_order(contents: &str) -> Vec<String> {
    let value: Value = serde_json::from_str(contents).unwrap();
    let object = value.as_object().unwrap().clone();
    let mut keys: Vec<(usize, String)> = object
        .keys()
        .map(|key| (contents.find(&format!("\n  \"{key}\"")).unwrap(), key.clone()))
        .collect();
    keys.sort();
    keys.into_iter().map(|(_, key)| key).collect()
}

/// Reconciling twice with no change gives an identical collection and document
#[test]
fn test_reconcile_idempotent_document() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::open(&dir.path().join("nb.py")).unwrap();
    let live_cells = vec![live("sessAAAA", "a", "1\n2"), live("sessBBBB", "b", "")];
    let mut collection = SnapshotCollection::new();

    reconcile(&mut collection, &live_cells).unwrap();
    store.write(&collection).unwrap();
    let first = fs::read(store.path()).unwrap();

    reconcile(&mut collection, &live_cells).unwrap();
    store.write(&collection).unwrap();
    let second = fs::read(store.path()).unwrap();

    assert_eq!(first, second);
}

/// Records are laid out by cell_index, whatever order they were inserted in
#[test]
fn test_document_ordered_by_cell_index() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::open(&dir.path().join("nb.py")).unwrap();
    let mut collection = SnapshotCollection::new();
    for (index, name) in [(2, "two"), (0, "zero"), (1, "one")] {
        let mut cell = CellSnapshot::from_view(&live(&format!("sess{name}"), name, ""), 0);
        cell.cell_index = index;
        collection.insert(cell);
    }

    store.write(&collection).unwrap();

    let contents = fs::read_to_string(store.path()).unwrap();
    assert_eq!(keys_in_order(&contents), vec!["zero", "one", "two"]);
}

/// The second of three cells raises: first updated, second gets the error,
/// third untouched
#[tokio::test]
async fn test_fail_fast_scenario() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::open(&dir.path().join("nb.py")).unwrap();
    let mut host = MockNotebook::new(dir.path().join("nb.py"))
        .with_cell(
            MockCell::new("sessAAAA", "one")
                .printing("fresh\n")
                .with_output("stale one"),
        )
        .with_cell(
            MockCell::new("sessBBBB", "two")
                .failing("Traceback\nNameError: x\n")
                .with_output("stale two"),
        )
        .with_cell(
            MockCell::new("sessCCCC", "three")
                .printing("never\n")
                .with_output("stale three"),
        );
    let mut driver = ExecutionDriver::new(store.clone());

    let report = driver.run_cycle(&mut host).await.unwrap();

    assert!(report.aborted);
    let persisted = store.load().unwrap();
    assert_eq!(persisted.get("one").unwrap().output(), ["fresh"]);
    assert_eq!(
        persisted.get("two").unwrap().output(),
        ["Traceback", "NameError: x"]
    );
    assert_eq!(persisted.get("three").unwrap().output(), ["stale three"]);
    assert_eq!(host.get("three").unwrap().run_count, 0);
}

/// Cells added, renamed and removed between cycles
#[tokio::test]
async fn test_live_set_changes_between_cycles() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::open(&dir.path().join("nb.py")).unwrap();
    let mut host = MockNotebook::new(dir.path().join("nb.py"))
        .with_cell(MockCell::new("sessAAAA", "A").printing("a\n"));
    let mut driver = ExecutionDriver::new(store.clone());
    driver.run_cycle(&mut host).await.unwrap();

    host.push(MockCell::new("sessBBBB", "B").printing("b\n"));
    let report = driver.run_cycle(&mut host).await.unwrap();
    assert_eq!(report.summary.created, 1);
    assert_eq!(report.summary.updated, 1);

    host.remove("B");
    host.get_mut("A").unwrap().name = "renamed".to_string();
    let report = driver.run_cycle(&mut host).await.unwrap();
    assert_eq!(report.summary.deleted, 1);

    let persisted = store.load().unwrap();
    assert_eq!(persisted.len(), 1);
    let renamed = persisted.get("renamed").unwrap();
    assert_eq!(renamed.full_id(), "sessAAAA");
    assert_eq!(renamed.short_id(), "AAAA");
}
