//! Tracing subscriber setup for the launcher.

use crate::args::{LogFormat, LogLevel};
use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the non-blocking file writer flushing until dropped.
pub struct LoggingHandles {
    pub guard: Option<WorkerGuard>,
}

/// Installs the global subscriber. `RUST_LOG` overrides `level` when set.
pub fn init_tracing(
    level: LogLevel,
    format: LogFormat,
    file_path: Option<&Path>,
) -> Result<LoggingHandles> {
    use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

    let level = level.as_str();
    let filter_spec = format!("{level},nodeboot={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_spec));

    let mut guard = None;
    let writer: BoxMakeWriter = match file_path {
        Some(path) => {
            let (file, file_guard) = create_file_writer(path)?;
            guard = Some(file_guard);
            BoxMakeWriter::new(io::stderr.and(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(guard.is_none());

    match format {
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
        LogFormat::Pretty => {
            let _ = builder.pretty().try_init();
        }
        LogFormat::Text => {
            let _ = builder.try_init();
        }
    }
    Ok(LoggingHandles { guard })
}

fn create_file_writer(path: &Path) -> Result<(non_blocking::NonBlocking, WorkerGuard)> {
    let file_path = resolve_log_file(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&file_path)
        .with_context(|| format!("failed to open log file {}", file_path.display()))?;
    Ok(non_blocking(file))
}

/// A path with an extension (or an existing file) is used as is; anything
/// else is treated as a directory holding a dated log file. The containing
/// directory is created either way.
fn resolve_log_file(path: &Path) -> Result<PathBuf> {
    let (directory, file_path) = if path.is_file() || path.extension().is_some() {
        (
            path.parent().filter(|parent| !parent.as_os_str().is_empty()),
            path.to_path_buf(),
        )
    } else {
        (Some(path), path.join(default_log_name()))
    };

    if let Some(directory) = directory {
        fs::create_dir_all(directory)
            .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    }
    Ok(file_path)
}

fn default_log_name() -> String {
    format!("nodeboot-{}.log", Local::now().format("%Y-%m-%d"))
}
