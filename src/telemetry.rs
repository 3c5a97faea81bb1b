//! Logging setup for hosts embedding the gate.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` picks between debug and
/// warn output for this crate. Safe to call more than once: later calls are
/// ignored once a global subscriber is set.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("modelgate=debug,info")
        } else {
            EnvFilter::new("modelgate=warn")
        }
    });

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();

    if installed.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
