//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` wins over the configured level; `verbose` forces `debug`.
pub fn init(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    // A second initialisation (e.g. in tests) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
