//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// One JSON object per line, for log shippers.
    #[default]
    Json,
    /// Human-readable multi-line output for local runs.
    Pretty,
}

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` wins over `default_filter` when set. Safe to call multiple
/// times (subsequent calls are no-ops).
pub fn init(default_filter: &str, output: LogOutput) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = match output {
        LogOutput::Json => builder.json().with_target(false).try_init(),
        LogOutput::Pretty => builder.pretty().try_init(),
    };
}
