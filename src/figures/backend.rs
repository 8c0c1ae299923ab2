//! Rendering-backend extension points the host runtime provides

use std::path::PathBuf;

use image::DynamicImage;
use serde::Serialize;

/// Mimetype used for reporting figure paths
pub const TEXT_PLAIN: &str = "text/plain";

/// Channel an output event is broadcast on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellChannel {
    Output,
}

/// Typed output event routed to the host's output channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputEvent {
    pub channel: CellChannel,
    pub mimetype: String,
    pub data: String,
    pub cell_id: String,
}

impl OutputEvent {
    pub fn plain_text(cell_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            channel: CellChannel::Output,
            mimetype: TEXT_PLAIN.to_string(),
            data: data.into(),
            cell_id: cell_id.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FigureError {
    #[error("Failed to render figure: {0}")]
    Render(String),

    #[error("Failed to read figure {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to save figure {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// A rendered figure waiting to be shown
pub trait Figure: Send {
    fn rasterize(&self) -> Result<DynamicImage, FigureError>;
}

/// The host's figure manager for one "render now" call
pub trait FigureRenderer {
    /// Figures pending display, in creation order
    fn pending_figures(&self) -> Vec<&dyn Figure>;

    /// The backend's normal completion step (closing figures, freeing resources)
    fn complete_show(&mut self);
}

/// What the adapter needs from the host application
pub trait RuntimeContext: Send + Sync {
    /// ID of the cell currently executing, if any
    fn current_cell_id(&self) -> Option<String>;

    fn broadcast_output(&self, event: OutputEvent);
}
