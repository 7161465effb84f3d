//! Structured logging
//!
//! Installs the global `tracing` subscriber: JSON or text lines, written
//! through a non-blocking worker to stdout or to a size-rotated file.

use crate::core::config::LoggingConfig;
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Keeps the background log writer alive; dropping it flushes pending lines
pub struct Logger {
    _guard: WorkerGuard,
}

impl Logger {
    /// Initialize the logging system based on configuration
    ///
    /// `RUST_LOG`, when set, takes precedence over the configured level.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        let (writer, guard) = open_writer(config)?;

        let fmt_layer = match config.format.as_str() {
            "json" => fmt::layer()
                .json()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true)
                .boxed(),
            "text" => fmt::layer()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            other => anyhow::bail!("Invalid format configuration: {}", other),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize tracing subscriber")?;

        tracing::info!(
            level = %config.level,
            format = %config.format,
            output = %config.output,
            "Logging system initialized"
        );

        Ok(Logger { _guard: guard })
    }
}

fn open_writer(config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    match config.output.as_str() {
        "stdout" => Ok(tracing_appender::non_blocking(io::stdout())),
        "file" => {
            let log_file = config
                .log_file
                .as_ref()
                .context("log_file must be specified when output is 'file'")?;

            if let Some(parent) = log_file.parent() {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }

            let appender = RollingFileAppender::new(
                log_file.clone(),
                config.max_file_size,
                config.max_backups,
            );
            Ok(tracing_appender::non_blocking(appender))
        }
        other => anyhow::bail!("Invalid output configuration: {}", other),
    }
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {}", level),
    }
}

/// File writer that rotates to `<name>.1 .. <name>.N` once a size limit is hit
///
/// Only the non-blocking worker thread writes to it, so no locking is needed.
pub struct RollingFileAppender {
    path: PathBuf,
    max_file_size: usize,
    max_backups: usize,
    file: Option<File>,
    written: usize,
}

impl RollingFileAppender {
    pub fn new(path: PathBuf, max_file_size: usize, max_backups: usize) -> Self {
        Self {
            path,
            max_file_size,
            max_backups,
            file: None,
            written: 0,
        }
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        for i in (1..self.max_backups).rev() {
            shift(&self.backup_path(i), &self.backup_path(i + 1))?;
        }
        shift(&self.path, &self.backup_path(1))?;

        self.written = 0;
        Ok(())
    }

    fn current(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            self.written = file.metadata()?.len() as usize;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))
    }
}

fn shift(from: &Path, to: &Path) -> io::Result<()> {
    if from.exists() {
        if to.exists() {
            fs::remove_file(to)?;
        }
        fs::rename(from, to)?;
    }
    Ok(())
}

impl Write for RollingFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Opening first picks up the size of a file left by a previous run
        self.current()?;
        if self.written > 0 && self.written + buf.len() > self.max_file_size {
            self.rotate()?;
        }

        let written = self.current()?.write(buf)?;
        self.written += written;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}
