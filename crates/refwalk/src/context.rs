//! Runtime controls for a dereference run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runtime controls shared with the caller while a run executes.
///
/// The interrupt flag can be flipped from another task; the traversal
/// checks it before every node and aborts with
/// [`RefwalkError::Interrupted`](crate::RefwalkError::Interrupted).
#[derive(Debug, Clone)]
pub struct DereferenceContext {
    /// Interrupt flag - set to true to abort the run
    pub interrupt: Arc<AtomicBool>,

    /// Whether to emit per-node trace events
    pub trace: bool,
}

impl Default for DereferenceContext {
    fn default() -> Self {
        Self {
            interrupt: Arc::new(AtomicBool::new(false)),
            trace: false,
        }
    }
}

impl DereferenceContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable per-node trace events.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Check if the run has been interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Request interruption of the run.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Reset the interrupt flag.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }
}
