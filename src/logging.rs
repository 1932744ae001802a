//! Diagnostic logging.
//!
//! Structured `tracing` output goes to stderr so it never mixes with the
//! tables and status lines printed on stdout. The filter comes from
//! `RUST_LOG` when set.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// Default levels: `yfitops=warn`, or `yfitops=debug` with `verbose`; other
/// crates only report errors.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "yfitops=debug,error"
        } else {
            "yfitops=warn,error"
        })
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
