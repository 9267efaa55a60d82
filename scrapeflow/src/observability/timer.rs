//! Wall-clock timers.

use std::time::Instant;
use tracing::debug;

/// Measures how long a named piece of work takes.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// The timer's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the timer, logs the duration at debug level and returns it.
    pub fn finish(self) -> f64 {
        let duration_ms = self.elapsed_ms();
        debug!(span = %self.name, duration_ms, "Finished");
        duration_ms
    }
}
