//! Progress and cancellation hooks consulted while a fetch is in flight.

use std::sync::Arc;

use bstr::ByteSlice;

use crate::interrupt::CancellationFlag;

/// Receives remote progress messages and tells long-running operations when to stop.
pub trait ProgressMonitor {
    /// Return `true` if the operation should be abandoned at the next opportunity.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Called with each progress message the remote sends on sideband channel 2.
    fn on_progress_text(&mut self, text: &[u8]);
}

/// A monitor that ignores progress and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl ProgressMonitor for Discard {
    fn on_progress_text(&mut self, _text: &[u8]) {}
}

/// A monitor that forwards progress to `tracing` and optionally observes a [`CancellationFlag`].
#[derive(Debug, Default, Clone)]
pub struct Log {
    cancellation: Option<Arc<CancellationFlag>>,
}

impl Log {
    /// Create a monitor that only logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop as soon as `flag` is cancelled.
    pub fn with_cancellation(mut self, flag: Arc<CancellationFlag>) -> Self {
        self.cancellation = Some(flag);
        self
    }
}

impl ProgressMonitor for Log {
    fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|flag| flag.is_cancelled())
    }

    fn on_progress_text(&mut self, text: &[u8]) {
        let end = text.iter().rposition(|b| !matches!(*b, b'\r' | b'\n')).map_or(0, |pos| pos + 1);
        let text = &text[..end];
        if !text.is_empty() {
            tracing::debug!(target: "gix_fetch::remote", "{}", text.as_bstr());
        }
    }
}

impl<T: ProgressMonitor + ?Sized> ProgressMonitor for &mut T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }

    fn on_progress_text(&mut self, text: &[u8]) {
        (**self).on_progress_text(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_follows_the_flag() {
        let flag = Arc::new(CancellationFlag::new());
        let mut monitor = Log::new().with_cancellation(flag.clone());
        monitor.on_progress_text(b"Counting objects: 1\r");
        assert!(!monitor.is_cancelled());
        flag.cancel();
        assert!(monitor.is_cancelled());
    }

    #[test]
    fn discard_never_cancels() {
        assert!(!Discard.is_cancelled());
    }
}
