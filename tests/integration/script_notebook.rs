//! Integration tests for running script notebooks end to end

use std::fs;

use rummo::snapshot::SnapshotStore;
use rummo::{run_once, Config, FailurePolicy};
use tempfile::TempDir;

use super::common::fixtures::{snapshot_dir, write_notebook, write_png};

const NOTEBOOK: &str = r#"
[[cell]]
name = "setup"
run = "echo ready"

[[cell]]
name = "count"
run = "printf '1\n2\n3\n'"
"#;

#[tokio::test]
async fn test_run_once_writes_snapshot() {
    let dir = TempDir::new().unwrap();
    let notebook = write_notebook(&dir, NOTEBOOK);

    let report = run_once(&notebook, &Config::default()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.snapshot_path, snapshot_dir(&dir).join("nb.json"));
    let collection = SnapshotStore::open(&notebook).unwrap().load().unwrap();
    assert_eq!(collection.get("setup").unwrap().output(), ["ready"]);
    let count = collection.get("count").unwrap();
    assert_eq!(count.output_line_count(), 3);
    assert_eq!(count.cell_index, 1);
    assert!(!count.stale);
}

#[tokio::test]
async fn test_run_once_rerun_updates_in_place() {
    let dir = TempDir::new().unwrap();
    let notebook = write_notebook(&dir, NOTEBOOK);
    run_once(&notebook, &Config::default()).await.unwrap();

    let report = run_once(&notebook, &Config::default()).await.unwrap();

    assert_eq!(report.summary.updated, 2);
    assert_eq!(report.summary.created, 0);
}

#[tokio::test]
async fn test_run_once_pinned_id_survives_rename() {
    let dir = TempDir::new().unwrap();
    let notebook = write_notebook(
        &dir,
        "[[cell]]\nname = \"before\"\nid = \"Hbol\"\nrun = \"echo x\"\n",
    );
    run_once(&notebook, &Config::default()).await.unwrap();

    write_notebook(
        &dir,
        "[[cell]]\nname = \"after\"\nid = \"Hbol\"\nrun = \"echo x\"\n",
    );
    let report = run_once(&notebook, &Config::default()).await.unwrap();

    assert_eq!(report.summary.updated, 1);
    assert_eq!(report.summary.deleted, 0);
    let collection = SnapshotStore::open(&notebook).unwrap().load().unwrap();
    assert!(collection.get("before").is_none());
    assert_eq!(collection.get("after").unwrap().short_id(), "Hbol");
}

#[tokio::test]
async fn test_run_once_names_with_colliding_digests() {
    let dir = TempDir::new().unwrap();
    let notebook = write_notebook(
        &dir,
        r#"
[[cell]]
name = "cell_132"
run = "echo first"

[[cell]]
name = "cell_378"
run = "echo second"
"#,
    );

    let report = run_once(&notebook, &Config::default()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.summary.created, 2);
    let collection = SnapshotStore::open(&notebook).unwrap().load().unwrap();
    let first = collection.get("cell_132").unwrap();
    let second = collection.get("cell_378").unwrap();
    assert_ne!(first.full_id(), second.full_id());
    assert_eq!(first.output(), ["first"]);
    assert_eq!(second.output(), ["second"]);
}

#[tokio::test]
async fn test_run_once_fail_fast_and_isolate() {
    let dir = TempDir::new().unwrap();
    let notebook = write_notebook(
        &dir,
        r#"
[[cell]]
name = "broken"
run = "echo 'bad input' >&2; exit 1"

[[cell]]
name = "after"
run = "echo later"
"#,
    );

    let report = run_once(&notebook, &Config::default()).await.unwrap();
    assert!(report.aborted);
    let collection = SnapshotStore::open(&notebook).unwrap().load().unwrap();
    assert_eq!(collection.get("broken").unwrap().output(), ["bad input"]);
    assert!(collection.get("after").unwrap().output().is_empty());

    let config = Config::default().with_failure_policy(FailurePolicy::Isolate);
    let report = run_once(&notebook, &config).await.unwrap();
    assert!(!report.aborted);
    assert_eq!(report.failures.len(), 1);
    let collection = SnapshotStore::open(&notebook).unwrap().load().unwrap();
    assert_eq!(collection.get("after").unwrap().output(), ["later"]);
}

#[tokio::test]
async fn test_run_once_captures_figures() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("fixture.png");
    write_png(&fixture);
    let notebook = write_notebook(
        &dir,
        r#"
[[cell]]
name = "plot"
run = "cp fixture.png \"$RUMMO_FIGURE_DIR/a.png\"; cp fixture.png \"$RUMMO_FIGURE_DIR/b.png\"; echo plotted"

[[cell]]
name = "text"
run = "echo no figures"
"#,
    );

    let report = run_once(&notebook, &Config::default().with_figures(true))
        .await
        .unwrap();

    assert!(report.is_success());
    let collection = SnapshotStore::open(&notebook).unwrap().load().unwrap();
    let plot = collection.get("plot").unwrap();
    let expected: Vec<String> = (1..=2)
        .map(|n| {
            snapshot_dir(&dir)
                .join(format!("nb_{}_fig-{n}.png", plot.short_id()))
                .display()
                .to_string()
        })
        .collect();
    assert_eq!(plot.img_files, expected);
    assert!(expected.iter().all(|p| fs::metadata(p).is_ok()));
    assert_eq!(plot.output(), ["plotted".to_string(), expected.join(",")]);
    assert!(collection.get("text").unwrap().img_files.is_empty());
}
