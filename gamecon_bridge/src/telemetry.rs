// Tracing subscriber setup for the `gamecon` binary.
//
// Library code only emits `tracing` events; installing a subscriber is the
// binary's job and happens once, at startup. Output goes to stderr so that
// `gamecon listen --json` can keep stdout for event records. Colour codes are
// only written when stderr is a terminal.
//
// The filter expression comes from `--log-filter`, falling back to
// `RUST_LOG`, falling back to `info`.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, fmt};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Filter used when neither a flag nor `RUST_LOG` provides one.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Install the global subscriber. Later calls are no-ops.
pub fn initialise(filter: Option<&str>) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD.get_or_try_init(|| install_subscriber(&resolve_filter(filter)))?;
    Ok(())
}

fn resolve_filter(flag: Option<&str>) -> String {
    flag.map(str::to_owned)
        .or_else(|| std::env::var("RUST_LOG").ok().filter(|value| !value.is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
}

fn install_subscriber(filter: &str) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_new(filter).map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
