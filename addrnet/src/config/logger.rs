//! # Logger
//!
//! Builds a JSON [`tracing`] logger from a [`Log`] config section.
//!
//! Every event is written as one JSON object per line, with the message
//! flattened to the top level and the source file and line attached. Outputs
//! are taken from [`Log::outputs`]:
//!
//! - `stdout`
//! - `stderr`
//! - anything else is a file path, created (or truncated) on startup
//!
//! The returned [`Dispatch`] is not installed anywhere; the caller decides
//! whether it becomes the global default or is scoped with
//! [`tracing::dispatcher::with_default`].
//!
//! ```rust,no_run
//! use addrnet::config::{List, Log, logger::new_logger};
//!
//! let log = Log {
//!     level: "debug".to_string(),
//!     outputs: List::new(["stderr", "/tmp/app.log"]),
//! };
//! let dispatch = new_logger(&log).unwrap();
//! tracing::dispatcher::set_global_default(dispatch).unwrap();
//! tracing::info!("ready");
//! ```
use super::Log;
use std::{fs::OpenOptions, io, path::PathBuf, sync::Mutex};
use thiserror::Error;
use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

/// Errors that can occur while building a logger.
#[derive(Debug, Error)]
pub enum LoggerErrors {
    /// Raised when a file output can't be opened for writing.
    #[error("could not open log output {}: {source}", .path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Maps a level name to a [`Level`]. Unknown names fall back to `INFO`.
pub fn parse_level(lvl: &str) -> Level {
    match lvl.trim().to_ascii_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "error" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        _ => Level::INFO,
    }
}

/// Builds a JSON logger writing to every output listed in `log`.
///
/// # Errors
/// Returns [`LoggerErrors::OpenOutput`] if a file output can't be opened.
pub fn new_logger(log: &Log) -> Result<Dispatch, LoggerErrors> {
    let mut writer: Option<BoxMakeWriter> = None;
    for output in log.outputs.to_vec() {
        let next = open_output(&output)?;
        writer = Some(match writer {
            Some(prev) => BoxMakeWriter::new(prev.and(next)),
            None => next,
        });
    }
    let writer = writer.unwrap_or_else(|| BoxMakeWriter::new(io::sink));

    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_file(true)
        .with_line_number(true)
        .with_max_level(parse_level(&log.level))
        .with_writer(writer)
        .finish();

    Ok(Dispatch::new(subscriber))
}

fn open_output(output: &str) -> Result<BoxMakeWriter, LoggerErrors> {
    match output {
        "stdout" => Ok(BoxMakeWriter::new(io::stdout)),
        "stderr" => Ok(BoxMakeWriter::new(io::stderr)),
        path => {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(|source| LoggerErrors::OpenOutput {
                    path: PathBuf::from(path),
                    source,
                })?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}
