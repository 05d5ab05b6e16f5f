//! Usage: Process-wide tracing setup (stdout, optional daily log file, `log` bridge).

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "usage-report.log";

/// Installs the global subscriber. The returned guard flushes the file writer and
/// must be held until the process exits.
pub(crate) fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, String> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("failed to create log dir {}: {e}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer);

    tracing_log::LogTracer::init().map_err(|e| format!("failed to install log bridge: {e}"))?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("failed to install tracing subscriber: {e}"))?;

    if let Some(dir) = log_dir {
        tracing::info!(dir = %dir.display(), "日志文件输出已启用");
    }
    Ok(guard)
}
