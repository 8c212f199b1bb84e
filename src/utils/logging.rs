use log::{log_enabled, Level};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Simple scoped timer for tracing the phases of a lubrication step.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("⏱️ start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            let elapsed = self.start.elapsed();
            log::trace!("⏱️ end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Latch that lets a message through once until it is re-armed.
///
/// Atomic so that a law shared across rayon workers can still warn once.
#[derive(Debug, Default)]
pub struct LogOnce {
    fired: AtomicBool,
}

impl LogOnce {
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Returns `true` for the first caller only.
    pub fn first(&self) -> bool {
        !self.fired.swap(true, Ordering::Relaxed)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Relaxed)
    }

    pub fn rearm(&self) {
        self.fired.store(false, Ordering::Relaxed);
    }
}

impl Clone for LogOnce {
    fn clone(&self) -> Self {
        Self {
            fired: AtomicBool::new(self.has_fired()),
        }
    }
}
