//! Log output for the binaries. The library itself only emits events.

use tracing_subscriber::EnvFilter;

/// Variable holding the filter directives, e.g. `openwith=debug`.
pub const LOG_ENV: &str = "OPENWITH_LOG";

/// Installs a stderr subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
