use {
    smsbridge_config::LoggingConfig,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Hosts may already have installed one, or register more than once; the
/// first subscriber stays in place.
pub(crate) fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(false),
            )
            .try_init()
    };

    if installed.is_err() {
        debug!("tracing subscriber already installed");
    }
}
