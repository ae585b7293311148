//! Diagnostic logging.
//!
//! User-facing progress is printed directly; `tracing` output is for
//! diagnosing a run and goes to stderr so it never interleaves with the
//! summary on stdout.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "bootstrap_deps=debug"
    } else {
        "bootstrap_deps=warn"
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `verbose`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(verbose).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
