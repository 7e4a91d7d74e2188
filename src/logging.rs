//! Tracing subscriber bootstrap for hosts embedding the engine.

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a global fmt subscriber filtered by `RUST_LOG`
///
/// Falls back to `default_directive` (e.g. `"info"`, `"lamvm=debug"`) when
/// `RUST_LOG` is unset or invalid.
///
/// # Errors
/// Returns error if a global subscriber is already installed
pub fn init_tracing(default_directive: &str) -> Result<(), SetGlobalDefaultError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
