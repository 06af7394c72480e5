use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the stderr `tracing` subscriber.
///
/// `RUST_LOG` picks the filter (default `warn`); `verbose` forces
/// `monkey=debug`. Safe to call more than once.
pub fn init(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = if verbose {
            EnvFilter::new("monkey=debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        };

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .try_init();
    });
}
