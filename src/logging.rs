use std::env;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingSettings;

/// Filter directive to use: `RUST_LOG` when set, else the configured level.
pub fn filter_directive(settings: &LoggingSettings) -> String {
    env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| settings.level.clone())
}

/// Install the stderr subscriber. A second call is a no-op.
pub fn init(settings: &LoggingSettings) {
    let directive = filter_directive(settings);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();
}
