use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};

use crate::figures::backend::{Figure, FigureError, FigureRenderer, OutputEvent, RuntimeContext};
use crate::figures::ledger::FigureLedger;
use crate::snapshot::short_id;
use crate::snapshot::store::{figure_path, SnapshotStore};

/// Everything the adapter needs, fixed when it is constructed
#[derive(Clone)]
pub struct AdapterContext {
    /// The host application the adapter reports to
    pub runtime: Arc<dyn RuntimeContext>,
    /// Directory figures are saved in
    pub output_dir: PathBuf,
    pub notebook_stem: String,
    pub format: ImageFormat,
    /// Where saved paths are recorded for the snapshot
    pub ledger: FigureLedger,
}

impl AdapterContext {
    /// Save figures alongside `store`'s snapshot document
    pub fn new(
        runtime: Arc<dyn RuntimeContext>,
        store: &SnapshotStore,
        format: ImageFormat,
        ledger: FigureLedger,
    ) -> Self {
        Self {
            runtime,
            output_dir: store.dir().to_path_buf(),
            notebook_stem: store.notebook_stem().to_owned(),
            format,
            ledger,
        }
    }
}

/// Rendering backend replacement that saves figures as files.
pub struct FigureCaptureAdapter {
    context: AdapterContext,
}

impl FigureCaptureAdapter {
    pub fn new(context: AdapterContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AdapterContext {
        &self.context
    }

    /// Handle one "render now" call.
    ///
    /// Saves each pending figure as `<stem>_<short_id>_fig-<n>.<ext>` (n is
    /// 1-based within this call), broadcasts the comma-joined paths as plain
    /// text for the current cell, then runs the renderer's own completion
    /// step. The completion step runs even if saving fails, and figures
    /// saved before the failure are removed again.
    pub fn show(&self, renderer: &mut dyn FigureRenderer) -> Result<Vec<PathBuf>, FigureError> {
        let Some(cell_id) = self.context.runtime.current_cell_id() else {
            tracing::warn!("Render requested outside of a cell, figures not captured");
            renderer.complete_show();
            return Ok(Vec::new());
        };

        let paths = match self.save_pending(&*renderer, &cell_id) {
            Ok(paths) => paths,
            Err(err) => {
                renderer.complete_show();
                return Err(err);
            }
        };

        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        self.context.ledger.record(&cell_id, names.iter().cloned());
        self.context
            .runtime
            .broadcast_output(OutputEvent::plain_text(&cell_id, names.join(",")));
        renderer.complete_show();

        tracing::debug!(cell_id = %cell_id, figures = paths.len(), "Captured figures");
        Ok(paths)
    }

    fn save_pending(
        &self,
        renderer: &dyn FigureRenderer,
        cell_id: &str,
    ) -> Result<Vec<PathBuf>, FigureError> {
        let short = short_id(cell_id);
        let mut paths = Vec::new();
        for (index, figure) in renderer.pending_figures().into_iter().enumerate() {
            let path = figure_path(
                &self.context.output_dir,
                &self.context.notebook_stem,
                short,
                index + 1,
                self.context.format,
            );
            if let Err(err) = self.save_figure(figure, &path) {
                discard(&paths);
                return Err(err);
            }
            paths.push(path);
        }
        Ok(paths)
    }

    fn save_figure(&self, figure: &dyn Figure, path: &Path) -> Result<(), FigureError> {
        let mut image = figure.rasterize()?;
        if self.context.format == ImageFormat::Jpeg {
            image = DynamicImage::ImageRgb8(image.to_rgb8());
        }
        image
            .save_with_format(path, self.context.format)
            .map_err(|source| FigureError::Save {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            tracing::debug!(path = %path.display(), error = %err, "Failed to remove partial figure");
        }
    }
}
