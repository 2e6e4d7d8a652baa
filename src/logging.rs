use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "MATCHFORM_LOG";
const DEFAULT_FILTER: &str = "matchform=warn";

static INIT: Once = Once::new();

/// Installs the stderr subscriber. Levels come from `MATCHFORM_LOG`
/// (e.g. `MATCHFORM_LOG=matchform=debug`), falling back to warnings only.
/// Safe to call more than once.
pub fn init() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .try_init();
    });
}
