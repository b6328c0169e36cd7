//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log` nor `HAZAMA_LOG` is given.
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter, falling back to [`DEFAULT_FILTER`] on a bad directive.
#[must_use]
pub fn filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(directives: &str, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(directives))
        .with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
