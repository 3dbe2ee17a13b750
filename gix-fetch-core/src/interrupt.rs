//! A shareable flag for cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};

/// A thread-safe cancellation flag that can be shared across threads.
///
/// The flag starts in a non-cancelled state. Once cancelled it stays cancelled.
#[derive(Debug, Default)]
pub struct CancellationFlag(AtomicBool);

impl CancellationFlag {
    /// Create a new cancellation flag in the non-cancelled state.
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Return `true` once [`cancel()`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
