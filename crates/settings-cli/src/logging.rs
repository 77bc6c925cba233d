//! Log output for the command-line tool

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// Reads `RUST_LOG`, falling back to `info`. Logs go to stderr so stdout
/// carries only command output.
pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
