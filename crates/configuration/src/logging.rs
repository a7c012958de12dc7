use crate::error::ConfigError;
use crate::settings::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level. When a log directory is configured a
/// second, non-ANSI layer writes to a daily rolling file; the returned guard must be
/// kept alive for as long as the process logs, otherwise buffered lines are lost.
pub fn init_tracing(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level).map_err(|e| {
            ConfigError::ValidationError(format!("invalid log level '{}': {e}", settings.level))
        })?,
    };

    let stdout_layer = fmt::layer().with_target(false);

    match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &settings.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()
                .map_err(|e| ConfigError::LoggingInit(e.to_string()))?;
            tracing::debug!(directory = %directory.display(), "File logging enabled.");
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .try_init()
                .map_err(|e| ConfigError::LoggingInit(e.to_string()))?;
            Ok(None)
        }
    }
}
