//! Logging setup for QueueBot using tracing.

use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How much logging a command wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    /// Long-running bot: console plus a daily rolling file.
    Service { dir: Option<PathBuf> },
    /// One-shot commands: warnings and errors on stderr only.
    Console,
}

impl LogMode {
    fn default_filter(&self) -> &'static str {
        match self {
            LogMode::Service { .. } => "info,queuebot=debug",
            LogMode::Console => "warn",
        }
    }
}

/// Initialize logging for `mode`.
///
/// In service mode the returned guard flushes the file writer on drop; keep
/// it alive for the life of the process.
pub fn init(mode: &LogMode) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(mode.default_filter()));

    fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
    }

    let LogMode::Service { dir } = mode else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer())
            .init();
        return Ok(None);
    };

    let log_dir = resolve_log_dir(dir.clone())?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "queuebot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer())
        .init();

    tracing::info!("Logging to {}", log_dir.display());

    Ok(Some(guard))
}

/// `dir` if given, otherwise `<data dir>/logs`.
fn resolve_log_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir);
    }

    let home = directories::ProjectDirs::from("com", "queuebot", "queuebot")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

    Ok(home.data_dir().join("logs"))
}
