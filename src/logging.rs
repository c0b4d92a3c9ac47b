//! Tracing setup for the `mlab` binary.
//!
//! Logs go to stderr so that `mlab preview` output can be piped as-is.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Honors `RUST_LOG`, defaulting to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
