//! Subscriber setup for binaries and demos.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use crate::errors::ScrapeflowError;

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ScrapeflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(ScrapeflowError::Internal(format!("unknown log format '{other}'"))),
        }
    }
}

/// Installs a global `fmt` subscriber filtered by `RUST_LOG` (default
/// `info`).
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), ScrapeflowError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match format {
        LogFormat::Plain => builder.compact().try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };

    installed.map_err(|e| ScrapeflowError::Internal(format!("cannot install subscriber: {e}")))
}
