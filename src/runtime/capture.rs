//! Scoped capture of standard output and standard error
//!
//! The driver owns one [`CaptureBuffers`] per cycle and installs it into the
//! host's [`CaptureRoute`]. Everything a cell writes while the route is
//! active lands in the buffers; the driver drains them after every cell so
//! at most one cell's text is ever in flight.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Streams {
    stdout: String,
    stderr: String,
}

/// Shared stdout/stderr scratch buffers for one run cycle
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffers {
    inner: Arc<Mutex<Streams>>,
}

impl CaptureBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_stdout(&self, text: &str) {
        self.inner.lock().stdout.push_str(text);
    }

    pub fn write_stderr(&self, text: &str) {
        self.inner.lock().stderr.push_str(text);
    }

    pub fn stdout(&self) -> String {
        self.inner.lock().stdout.clone()
    }

    pub fn stderr(&self) -> String {
        self.inner.lock().stderr.clone()
    }

    /// Return the accumulated stdout and reset it
    pub fn take_stdout(&self) -> String {
        std::mem::take(&mut self.inner.lock().stdout)
    }

    /// Return the accumulated stderr and reset it
    pub fn take_stderr(&self) -> String {
        std::mem::take(&mut self.inner.lock().stderr)
    }

    /// Reset both streams
    pub fn clear(&self) {
        let mut streams = self.inner.lock();
        streams.stdout.clear();
        streams.stderr.clear();
    }
}

/// Where a host sends cell output: into installed buffers while a capture
/// is active, otherwise straight through to the process streams.
#[derive(Debug, Clone, Default)]
pub struct CaptureRoute {
    active: Arc<Mutex<Option<CaptureBuffers>>>,
}

impl CaptureRoute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start capturing into `buffers`, replacing any previous capture
    pub fn install(&self, buffers: CaptureBuffers) {
        *self.active.lock() = Some(buffers);
    }

    /// Stop capturing and hand back the buffers that were active
    pub fn release(&self) -> Option<CaptureBuffers> {
        self.active.lock().take()
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    pub fn stdout(&self, text: &str) {
        match self.active.lock().as_ref() {
            Some(buffers) => buffers.write_stdout(text),
            None => {
                if let Err(e) = std::io::stdout().write_all(text.as_bytes()) {
                    tracing::debug!(error = %e, "Failed to pass stdout through");
                }
            }
        }
    }

    pub fn stderr(&self, text: &str) {
        match self.active.lock().as_ref() {
            Some(buffers) => buffers.write_stderr(text),
            None => {
                if let Err(e) = std::io::stderr().write_all(text.as_bytes()) {
                    tracing::debug!(error = %e, "Failed to pass stderr through");
                }
            }
        }
    }
}
