//! # Observability
//!
//! Tracing subscriber setup. Logs go to stderr so tables and secret values
//! printed on stdout stay clean.

use tracing::warn;

use crate::constants::DEFAULT_LOG_FILTER;

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence; `verbose` raises the default filter to debug.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "kvconsole=debug,keyvault_console=debug".to_string()
    } else {
        DEFAULT_LOG_FILTER.to_string()
    };

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        warn!("Tracing subscriber init returned error (may already be initialized): {}", e);
    }
}
