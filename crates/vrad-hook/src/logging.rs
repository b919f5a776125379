use camino::Utf8Path;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "VRAD.log";

/// Logs to stdout and to `VRAD.log` in `log_dir`.
///
/// The returned guard flushes the file on drop and must outlive all logging.
pub fn init_logging(log_dir: &Utf8Path) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "vrad=debug,bee_pack=debug".into());

    let stdout_layer = tracing_subscriber::fmt::layer();

    let (file_guard, file_layer) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let file_appender = rolling::never(log_dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(guard), Some(layer))
        }
        Err(e) => {
            eprintln!("Failed to create log directory {}: {}", log_dir, e);
            (None, None)
        }
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);
    if let Some(layer) = file_layer {
        registry.with(layer).init();
    } else {
        registry.init();
    }

    file_guard
}
