use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to initialize logger: {0}")]
    InitError(String),

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn init_logger(config: &crate::config::Config) -> Result<(), LoggerError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level()));

    let log_file = match config.log_file() {
        Some(path) => Some(File::create(&path).map_err(|source| LoggerError::LogFile { path, source })?),
        None => None,
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_output() {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(log_file.map(plain_file_layer))
            .try_init()
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(log_file.map(plain_file_layer))
            .try_init()
    };

    result.map_err(|e| LoggerError::InitError(e.to_string()))
}

/// Plain-text copy of the log stream, without colours.
fn plain_file_layer<S>(file: File) -> fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, Mutex<File>> {
    fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
}
