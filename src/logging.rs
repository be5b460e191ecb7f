//! Diagnostic logging.
//!
//! Progress meant for the user goes through `report::Reporter` on stdout;
//! `tracing` events go to stderr so both can be redirected independently.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level`. Calling this twice is harmless: the second
/// installation is ignored.
pub fn init_logging(level: &str) {
    let default_filter = format!("dm_scan={level}");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init();
}
