/// A cell's run operation failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Cell {cell} raised: {message}")]
    Raised { cell: String, message: String },

    #[error("Cell {cell} exited with status {}", .code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ExitStatus { cell: String, code: Option<i32> },

    #[error("Failed to start cell {cell}: {message}")]
    Spawn { cell: String, message: String },

    #[error("Cell {cell} failed to render figures: {message}")]
    Render { cell: String, message: String },
}

impl ExecutionError {
    /// Name of the cell that failed
    pub fn cell(&self) -> &str {
        match self {
            ExecutionError::Raised { cell, .. }
            | ExecutionError::ExitStatus { cell, .. }
            | ExecutionError::Spawn { cell, .. }
            | ExecutionError::Render { cell, .. } => cell,
        }
    }
}
