//! Tracing subscriber setup for embedders.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber, honoring `SLUICE_LOG` (falling back
/// to `RUST_LOG`, then `info`). Safe to call more than once; later calls
/// are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_env("SLUICE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
