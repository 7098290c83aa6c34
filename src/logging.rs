//! Tracing setup shared by the binaries.

use std::io;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_LOG_FILTER: &str = "tubestats_tools=info,backend=info,channel_report=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter and
/// `LOG_FORMAT=json` switches to structured output. Logs always go to stderr
/// so stdout stays clean for reports.
pub fn init_logging() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if use_json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .try_init()
    };

    if let Err(err) = result {
        tracing::debug!("tracing subscriber already installed: {err}");
    }
}
