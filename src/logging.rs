//! Subscriber setup for binaries and tests that embed the engine.

use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Installs a global subscriber: `RUST_LOG` style filtering (defaults to
/// `info`), formatted output and progress bars for update passes.
///
/// Log lines go through the progress bar writer so they never tear a bar that
/// is being drawn.
pub fn init() -> Result<(), TryInitError> {
    let indicatif = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif.get_stderr_writer()))
        .with(indicatif)
        .try_init()
}
