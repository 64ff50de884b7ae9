//! Log subscriber setup.
//!
//! Library code logs through the `log` facade; the server logs through
//! `tracing`. Both end up in the same `tracing_subscriber` registry.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber and the `log` -> `tracing` bridge.
///
/// Fails if a global logger or subscriber has already been installed.
pub fn init_logging(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_log::LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(
                registry.with(tracing_subscriber::fmt::layer()),
            )?;
        }
        LogFormat::Json => {
            tracing::subscriber::set_global_default(
                registry.with(tracing_subscriber::fmt::layer().json().with_current_span(true)),
            )?;
        }
    }

    Ok(())
}
