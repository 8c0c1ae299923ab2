//! Persisted representation of a single notebook cell

use serde::{Deserialize, Serialize};

use super::ids::short_id;
use super::output::normalize_output;

/// State of one live cell as reported by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub full_id: String,
    pub name: String,
    pub stale: bool,
    /// Last raw output text the host holds for this cell
    pub raw_output: Option<String>,
    pub cell_type: String,
}

/// Snapshot of one cell's identity, metadata and last captured output.
///
/// `short_id` is always derived from `full_id`, and `output_line_count`
/// always equals `output.len()`; both are kept private so they cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCellSnapshot")]
pub struct CellSnapshot {
    short_id: String,
    pub name: String,
    pub stale: bool,
    output: Vec<String>,
    output_line_count: usize,
    /// Figure artifacts produced by the most recent run of this cell
    pub img_files: Vec<String>,
    /// Coarse classification such as "code" or "markdown"
    pub cell_type: String,
    #[serde(rename = "cell_id")]
    full_id: String,
    /// Position in the host's current cell ordering
    pub cell_index: usize,
}

impl CellSnapshot {
    /// Build a fresh record from a live cell at `cell_index`.
    pub fn from_view(view: &CellView, cell_index: usize) -> Self {
        let mut cell = Self {
            short_id: String::new(),
            name: String::new(),
            stale: false,
            output: Vec::new(),
            output_line_count: 0,
            img_files: Vec::new(),
            cell_type: view.cell_type.clone(),
            full_id: view.full_id.clone(),
            cell_index,
        };
        cell.apply_view(view, cell_index);
        cell
    }

    /// Refresh identity, staleness, output and position from a live cell.
    ///
    /// `cell_type` and `img_files` are left as previously captured.
    pub fn apply_view(&mut self, view: &CellView, cell_index: usize) {
        self.full_id = view.full_id.clone();
        self.short_id = short_id(&self.full_id).to_owned();
        self.name = view.name.clone();
        self.stale = view.stale;
        self.set_output(view.raw_output.as_deref());
        self.cell_index = cell_index;
    }

    pub fn full_id(&self) -> &str {
        &self.full_id
    }

    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn output_line_count(&self) -> usize {
        self.output_line_count
    }

    /// Replace the captured output with the normalized form of `raw`.
    pub fn set_output(&mut self, raw: Option<&str>) {
        let (count, lines) = normalize_output(raw);
        self.output_line_count = count;
        self.output = lines;
    }
}

/// On-disk shape of a record. Derived fields are recomputed on load.
#[derive(Deserialize)]
struct StoredCellSnapshot {
    name: String,
    #[serde(default)]
    stale: bool,
    #[serde(default)]
    output: Vec<String>,
    #[serde(default)]
    img_files: Vec<String>,
    #[serde(default)]
    cell_type: String,
    cell_id: String,
    #[serde(default)]
    cell_index: usize,
}

impl From<StoredCellSnapshot> for CellSnapshot {
    fn from(stored: StoredCellSnapshot) -> Self {
        Self {
            short_id: short_id(&stored.cell_id).to_owned(),
            name: stored.name,
            stale: stored.stale,
            output_line_count: stored.output.len(),
            output: stored.output,
            img_files: stored.img_files,
            cell_type: stored.cell_type,
            full_id: stored.cell_id,
            cell_index: stored.cell_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(full_id: &str, name: &str, raw: Option<&str>) -> CellView {
        CellView {
            full_id: full_id.to_string(),
            name: name.to_string(),
            stale: false,
            raw_output: raw.map(str::to_string),
            cell_type: "code".to_string(),
        }
    }

    #[test]
    fn test_from_view_derives_fields() {
        let cell = CellSnapshot::from_view(&view("sessionHbol", "load", Some("1\n2")), 3);
        assert_eq!(cell.short_id(), "Hbol");
        assert_eq!(cell.full_id(), "sessionHbol");
        assert_eq!(cell.output(), ["1", "2"]);
        assert_eq!(cell.output_line_count(), 2);
        assert_eq!(cell.cell_index, 3);
        assert_eq!(cell.cell_type, "code");
        assert!(cell.img_files.is_empty());
    }

    #[test]
    fn test_apply_view_keeps_type_and_figures() {
        let mut cell = CellSnapshot::from_view(&view("sessionHbol", "load", None), 0);
        cell.img_files = vec!["nb_Hbol_fig-1.png".to_string()];
        cell.cell_type = "markdown".to_string();

        cell.apply_view(&view("sessionHbol", "renamed", Some("x")), 5);

        assert_eq!(cell.name, "renamed");
        assert_eq!(cell.cell_index, 5);
        assert_eq!(cell.output_line_count(), 1);
        assert_eq!(cell.cell_type, "markdown");
        assert_eq!(cell.img_files, vec!["nb_Hbol_fig-1.png".to_string()]);
    }

    #[test]
    fn test_deserialize_recomputes_derived_fields() {
        let json = r#"{
            "short_id": "zzzz",
            "name": "load",
            "stale": true,
            "output": ["a", "b"],
            "output_line_count": 99,
            "img_files": [],
            "cell_type": "code",
            "cell_id": "sessionHbol",
            "cell_index": 1
        }"#;
        let cell: CellSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(cell.short_id(), "Hbol");
        assert_eq!(cell.output_line_count(), 2);
        assert!(cell.stale);
    }
}
