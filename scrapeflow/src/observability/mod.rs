//! Observability utilities.
//!
//! This module provides:
//! - [`init_tracing`] to install a `tracing` subscriber
//! - [`SpanTimer`] for measuring durations

mod subscriber;
mod timer;

pub use subscriber::{init_tracing, LogFormat};
pub use timer::SpanTimer;
