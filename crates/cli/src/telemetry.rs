//! Diagnostic logging setup
//!
//! Diagnostics go to stderr; the job log file only receives banners and the
//! entry point's output.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `dailyrun=info`)
//! - `DAILYRUN_LOG_FORMAT`: `compact` (default), `pretty` or `json`

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "dailyrun=info";

/// Install the global subscriber. Keep the guard alive until exit so buffered
/// events are flushed.
pub fn init_logging() -> WorkerGuard {
    let log_format =
        std::env::var("DAILYRUN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .init();
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(writer))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(writer))
                .init();
        }
    }

    guard
}
