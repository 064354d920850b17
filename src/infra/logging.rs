//! Tracing subscriber setup for the binaries.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,myfit_store=debug,tower_http=info";

/// Installs a global fmt subscriber. `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
