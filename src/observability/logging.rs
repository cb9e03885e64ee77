//! Structured logging setup.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::LogSettings;

// Keeps the non-blocking file writer flushing for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static INITIALIZED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("no log output configured, enable stdout or file")]
    NoSinks,

    #[error("failed to initialize logging: {0}")]
    Init(String),
}

/// Install the global tracing subscriber.
///
/// Idempotent: the first call wins and later calls return `Ok` without
/// touching the installed subscriber. The `RUST_LOG` environment
/// variable overrides the configured level when set.
pub fn init(settings: &LogSettings) -> Result<(), LoggingError> {
    if INITIALIZED.set(()).is_err() {
        return Ok(());
    }

    if !settings.stdout && !settings.file {
        return Err(LoggingError::NoSinks);
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = settings
        .stdout
        .then(|| tracing_subscriber::fmt::layer().with_target(true));

    let file_layer = if settings.file {
        let appender =
            tracing_appender::rolling::daily(&settings.directory, &settings.file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|error| LoggingError::Init(error.to_string()))
}
