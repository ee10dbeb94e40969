//! Tracing subscriber setup for the `autoscan` binary.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::types::AutoscanError;

/// `RUST_LOG` wins; otherwise `info`, or `debug` when verbose.
pub fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber, writing to stderr or appending to
/// `log_file`.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<(), AutoscanError> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| {
                    AutoscanError::Config(format!("opening logfile {}: {err}", path.display()))
                })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = match log_file {
        Some(_) => None,
        None => Some(fmt::layer().with_writer(std::io::stderr)),
    };

    Registry::default()
        .with(env_filter(verbose))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|err| AutoscanError::Config(format!("initializing logging: {err}")))
}
