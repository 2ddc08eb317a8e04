//! Logging setup for Sift.
//!
//! The global subscriber is built from [`LoggingConfig`]: an `EnvFilter`
//! (`RUST_LOG` replaces the configured base level, per-module `filters` are
//! added on top) and one `fmt` layer writing to stdout, stderr or a rolling
//! file.
//!
//! The dispatcher opens a `dispatch` span per update (`update_id`, `kind`).
//! Setting `span_events.new` and `span_events.close` logs one pair of lines
//! per dispatched update.

use std::ffi::OsStr;
use std::path::Path;

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A per-module filter did not form a valid directive.
    #[error("invalid log filter '{directive}': {source}")]
    Directive {
        directive: String,
        #[source]
        source: ParseError,
    },

    /// The log file could not be opened.
    #[error("failed to open log file: {0}")]
    File(#[from] InitError),

    /// A global subscriber is already installed.
    #[error(transparent)]
    AlreadyInstalled(#[from] TryInitError),
}

/// Installs the subscriber described by `config`.
///
/// An already installed subscriber is kept and is not an error.
pub fn init_from_config(config: &LoggingConfig) -> Result<(), LoggingError> {
    match try_init(config) {
        Err(LoggingError::AlreadyInstalled(_)) => Ok(()),
        result => result,
    }
}

/// Installs the subscriber described by `config`, failing if one exists.
pub fn try_init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = env_filter(config)?;
    let layer = fmt_layer(config, make_writer(config)?);

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;
    Ok(())
}

/// Opens the rolling appender for `path`.
///
/// The file stem and extension of `path` become the file name prefix and
/// suffix, so `logs/sift.log` rotated daily yields `logs/sift.<date>.log`.
pub fn file_appender(
    path: &Path,
    config: &LoggingConfig,
) -> Result<RollingFileAppender, InitError> {
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation(config.rotation))
        .max_log_files(config.max_files as usize);
    if let Some(stem) = path.file_stem().and_then(OsStr::to_str) {
        builder = builder.filename_prefix(stem);
    }
    if let Some(extension) = path.extension().and_then(OsStr::to_str) {
        builder = builder.filename_suffix(extension);
    }

    builder.build(directory)
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Never => Rotation::NEVER,
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
    }
}

/// Per-module directives, sorted by module for a stable filter.
fn directives(config: &LoggingConfig) -> Vec<String> {
    let mut filters: Vec<_> = config.filters.iter().collect();
    filters.sort_by_key(|(module, _)| *module);
    filters
        .into_iter()
        .map(|(module, level)| format!("{module}={level}"))
        .collect()
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    for directive in directives(config) {
        let parsed: Directive = directive
            .parse()
            .map_err(|source| LoggingError::Directive {
                directive: directive.clone(),
                source,
            })?;
        filter = filter.add_directive(parsed);
    }

    Ok(filter)
}

fn span_events(config: &SpanEventConfig) -> FmtSpan {
    [
        (config.new, FmtSpan::NEW),
        (config.enter, FmtSpan::ENTER),
        (config.exit, FmtSpan::EXIT),
        (config.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |acc, (_, span)| acc | span)
}

fn make_writer(config: &LoggingConfig) -> Result<BoxMakeWriter, LoggingError> {
    Ok(match (config.output, &config.file_path) {
        (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
        (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
        (LogOutput::File, Some(path)) => BoxMakeWriter::new(file_appender(path, config)?),
        // Rejected by validation.
        (LogOutput::File, None) => BoxMakeWriter::new(std::io::stderr),
    })
}

fn fmt_layer(
    config: &LoggingConfig,
    writer: BoxMakeWriter,
) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.output != LogOutput::File)
        .with_span_events(span_events(&config.span_events))
        .with_thread_ids(config.thread_ids)
        .with_file(config.file_location)
        .with_line_number(config.file_location);

    match config.format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Full => layer.boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        #[cfg(feature = "json-log")]
        LogFormat::Json => layer.json().boxed(),
    }
}
