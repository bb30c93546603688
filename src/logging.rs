use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{data_dir, LoggingConfig};

/// Install the global subscriber. `tui` suppresses the stderr layer because
/// the board owns the terminal.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// until the process is about to exit.
pub fn init_tracing(logging: &LoggingConfig, tui: bool) -> Result<Option<WorkerGuard>, String> {
    if !logging.enabled {
        return Ok(None);
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(&logging.level).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;
    let mut guard = None;
    if logging.file {
        let dir = logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir().join("logs"));

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let appender = tracing_appender::rolling::daily(dir, "taskboard.log");
        let (non_blocking, worker) = tracing_appender::non_blocking(appender);
        guard = Some(worker);
        maybe_writer = Some(non_blocking);
    }

    let console = logging.console && !tui;
    if !console && maybe_writer.is_none() {
        return Ok(None);
    }

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())?;
    Ok(guard)
}
