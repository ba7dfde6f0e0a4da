//! Logging setup
//!
//! Log lines go to stderr, or to a daily rolling file when `RELAY_LOG_DIR`
//! is set. `RUST_LOG` controls the filter.

use crate::config::{LogFormat, ServerConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "drive-upload-relay.log";
const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer and must be held until exit.
pub fn init(config: &ServerConfig) -> Result<Option<WorkerGuard>, String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create log directory {}: {}", dir.display(), e))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.log_dir.is_none());

    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|e| format!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}
