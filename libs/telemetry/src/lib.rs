//! Logging setup for the pipeline binaries
//!
//! Filtering comes from `RUST_LOG` (default `info`). Output is human-readable
//! unless `LOG_FORMAT=json`, which switches to one flattened JSON object per
//! event.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_VAR).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber. Call once, first thing in `main`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let format = LogFormat::from_env();
    match format {
        LogFormat::Json => fmt().with_env_filter(filter).json().flatten_event(true).init(),
        LogFormat::Pretty => fmt().with_env_filter(filter).init(),
    }
    tracing::debug!(?format, "Logging initialized");
}
