//! Tracing subscriber bootstrap for binaries embedding the engine

use crate::BoxError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a global tracing subscriber.
///
/// The level filter comes from `RUST_LOG`, defaulting to `info`. Fails
/// instead of panicking when a global subscriber is already installed.
pub fn init() -> Result<(), BoxError> {
    init_with_default("info")
}

/// Like [`init`], with a different fallback filter when `RUST_LOG` is unset.
pub fn init_with_default(default_filter: &str) -> Result<(), BoxError> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    let filter_layer =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
