//! Logging and tracing utilities

use crate::config::{AppConfig, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with the default configuration
pub fn init_tracing() {
    init_tracing_with(&AppConfig::default());
}

/// Initialize tracing for `config`
///
/// `RUST_LOG` takes precedence over `config.log_filter`. Output goes to
/// stderr so stdout stays free for command results. Calling this twice is a
/// no-op.
pub fn init_tracing_with(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(
            app = %config.app_name,
            environment = %config.environment,
            format = %config.log_format,
            "Tracing initialized"
        );
    }
}
